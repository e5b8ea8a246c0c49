use serde::Serialize;

/// Landing data for a signed-in administrator.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminOverview {
    /// Email of the signed-in administrator, falling back to the provider user id.
    #[schema(example = "admin@example.com")]
    pub signed_in_as: String,
    pub videos: u64,
    pub case_studies: u64,
    pub showcase_items: u64,
}

/// Shown at the login entry point to a caller without a session.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginEntry {
    /// Endpoint accepting the credentials.
    #[schema(example = "/api/v1/auth/login")]
    pub login_endpoint: &'static str,
    /// Where a successful sign-in leads.
    #[schema(example = "/admin")]
    pub redirect_to: String,
}
