use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::kind::DeclarationKind;

pub const NAMESPACE_SEPARATOR: char = '\\';

/// One discovered type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Declaration {
    name: String,
    kind: DeclarationKind,
    file: PathBuf,
    line: usize,
}

impl Declaration {
    pub fn new(
        name: impl Into<String>,
        kind: DeclarationKind,
        file: impl Into<PathBuf>,
        line: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            file: file.into(),
            line,
        }
    }

    /// Fully-qualified name, e.g. `App\Http\Kernel`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// 1-based line of the declaration keyword (or its leading attributes).
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn short_name(&self) -> &str {
        match self.name.rfind(NAMESPACE_SEPARATOR) {
            Some(pos) => &self.name[pos + 1..],
            None => &self.name,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.name
            .rfind(NAMESPACE_SEPARATOR)
            .map(|pos| &self.name[..pos])
    }
}

/// Resolves a declared name against the namespace in effect.
///
/// A name starting with `\` is already fully qualified.
pub fn qualify(namespace: Option<&str>, local: &str) -> String {
    if let Some(absolute) = local.strip_prefix(NAMESPACE_SEPARATOR) {
        return absolute.to_string();
    }
    match namespace.filter(|ns| !ns.is_empty()) {
        Some(ns) => format!("{ns}{NAMESPACE_SEPARATOR}{local}"),
        None => local.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_joins_namespace_and_local_name() {
        assert_eq!(qualify(Some("App\\Model"), "User"), "App\\Model\\User");
        assert_eq!(qualify(None, "User"), "User");
        assert_eq!(qualify(Some(""), "User"), "User");
    }

    #[test]
    fn qualify_keeps_fully_qualified_names() {
        assert_eq!(qualify(Some("Ignored"), "\\Vendor\\Thing"), "Vendor\\Thing");
    }

    #[test]
    fn splits_short_name_and_namespace() {
        let decl = Declaration::new("App\\Model\\User", DeclarationKind::Class, "User.php", 3);
        assert_eq!(decl.short_name(), "User");
        assert_eq!(decl.namespace(), Some("App\\Model"));

        let global = Declaration::new("Kernel", DeclarationKind::Class, "Kernel.php", 1);
        assert_eq!(global.short_name(), "Kernel");
        assert_eq!(global.namespace(), None);
    }
}
