//! Repository bean naming convention.

const REPOSITORY_SUFFIX: &str = "Repository";

/// Returns the unqualified, generic-free name of `T`.
///
/// `my_app::model::Order<Draft>` becomes `Order`.
pub fn simple_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// Bean name under which the repository for `entity_name` is registered:
/// first character lowercased, then the `Repository` suffix.
pub fn repository_bean_name(entity_name: &str) -> String {
    let mut chars = entity_name.chars();
    match chars.next() {
        Some(first) => {
            let mut name: String = first.to_lowercase().collect();
            name.push_str(chars.as_str());
            name.push_str(REPOSITORY_SUFFIX);
            name
        }
        None => REPOSITORY_SUFFIX.to_string(),
    }
}

/// Type name of the repository expected for `entity_name`, used in
/// diagnostics.
pub fn repository_type_name(entity_name: &str) -> String {
    format!("{entity_name}{REPOSITORY_SUFFIX}")
}
