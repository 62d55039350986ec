use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ResolverParams {
    pub token: String,
}
