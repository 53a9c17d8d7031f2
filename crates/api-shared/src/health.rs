use crate::dto::HealthRes;

/// Health service shared by the server binaries.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Check health without creating an instance.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "CellCount is alive".into(),
        }
    }
}
