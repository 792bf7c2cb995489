use crate::compute::models::ServiceAccount;
use crate::config::ProvisionerConfig;
use crate::properties::VmProperties;

/// Service account entry for the instance.
///
/// Nothing requested yields no entry. Scopes without an account use the
/// default account; an account without scopes gets full access. Short scopes
/// are expanded with `scope_prefix`.
#[must_use]
pub fn service_accounts(props: &VmProperties, config: &ProvisionerConfig) -> Vec<ServiceAccount> {
    let account = props.service_account.as_deref().filter(|a| !a.is_empty());

    if account.is_none() && props.service_scopes.is_empty() {
        return Vec::new();
    }

    let email = account.unwrap_or(&config.default_service_account).to_string();

    let scopes = if props.service_scopes.is_empty() {
        vec![config.full_access_scope.clone()]
    } else {
        props
            .service_scopes
            .iter()
            .map(|scope| {
                if scope.starts_with(&config.scope_prefix) {
                    scope.clone()
                } else {
                    format!("{}{scope}", config.scope_prefix)
                }
            })
            .collect()
    };

    vec![ServiceAccount { email, scopes }]
}
