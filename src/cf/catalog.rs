use std::collections::HashMap;

use crate::models::{MysqlService, ServiceBinding, ServiceInstance};

/// Scheme prefix identifying MySQL credentials in a binding URI.
pub const MYSQL_URI_SCHEME: &str = "mysql://";

/// Joins instances with their bindings and keeps the reachable MySQL
/// databases of one space.
///
/// An instance survives when it lives in `space_guid`, has a binding, and
/// the binding URI starts with `mysql://`. Output follows instance order.
/// When several bindings reference the same instance the last one wins.
pub fn available_services(
    instances: &[ServiceInstance],
    bindings: &[ServiceBinding],
    space_guid: &str,
) -> Vec<MysqlService> {
    let bound: HashMap<&str, &ServiceBinding> = bindings
        .iter()
        .map(|b| (b.service_instance_guid.as_str(), b))
        .collect();

    instances
        .iter()
        .filter(|instance| instance.space_guid == space_guid)
        .filter_map(|instance| {
            bound
                .get(instance.guid.as_str())
                .filter(|binding| binding.uri.starts_with(MYSQL_URI_SCHEME))
                .map(|binding| MysqlService::from_binding(&instance.name, binding))
        })
        .collect()
}
