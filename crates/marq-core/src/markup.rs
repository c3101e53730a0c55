//! Markup unit catalog over a module's embedded resources.

use crate::module::{Module, Resource};

/// Recognized markup file suffixes, matched case-insensitively.
pub const MARKUP_SUFFIXES: &[&str] = &[".marq", ".uiml", ".xuml"];

/// True if `name` ends in one of the recognized markup suffixes.
pub fn is_markup_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    MARKUP_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

/// One candidate markup unit held in a module. Immutable once read.
#[derive(Debug, Clone)]
pub struct MarkupUnit {
    pub name: String,
    pub path: String,
    pub uri: String,
    pub contents: Vec<u8>,
}

impl MarkupUnit {
    fn from_resource(res: &Resource) -> Self {
        Self {
            name: res.name.clone(),
            path: res.path.clone(),
            uri: res.uri.clone(),
            contents: res.contents.clone(),
        }
    }

    /// Default target class name: the unit's file name minus its suffix.
    pub fn class_stem(&self) -> &str {
        let lower = self.name.to_lowercase();
        for suffix in MARKUP_SUFFIXES {
            if lower.ends_with(suffix) {
                return &self.name[..self.name.len() - suffix.len()];
            }
        }
        &self.name
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }
}

/// Enumerates the markup units embedded in a module.
pub struct Catalog<'a> {
    module: &'a Module,
}

impl<'a> Catalog<'a> {
    pub fn new(module: &'a Module) -> Self {
        Self { module }
    }

    /// All resources with a recognized markup suffix.
    pub fn units(&self) -> Vec<MarkupUnit> {
        self.module
            .resources
            .iter()
            .filter(|r| is_markup_name(&r.name))
            .map(MarkupUnit::from_resource)
            .collect()
    }
}

/// Standard URI for a markup resource embedded in `module_name`.
pub fn resource_uri(name: &str, module_name: &str) -> String {
    format!("res:{name}?module={module_name}")
}

/// Resolved markup content handed to the JIT compiler by discovery.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: String,
    pub uri: String,
    pub contents: Vec<u8>,
}

impl FileSource {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;

    fn resource(name: &str) -> Resource {
        Resource {
            name: name.to_owned(),
            path: format!("demo/{name}"),
            uri: resource_uri(name, "demo"),
            contents: Vec::new(),
        }
    }

    #[test]
    fn suffix_match_is_case_insensitive() {
        assert!(is_markup_name("Widget.marq"));
        assert!(is_markup_name("Widget.UIML"));
        assert!(is_markup_name("widget.XuMl"));
        assert!(!is_markup_name("Widget.xml"));
        assert!(!is_markup_name("Widget.marq.txt"));
    }

    #[test]
    fn catalog_skips_non_markup_resources() {
        let mut module = Module::new("demo");
        module.resources.push(resource("Widget.marq"));
        module.resources.push(resource("icon.png"));
        module.resources.push(resource("Panel.UIML"));

        let units = Catalog::new(&module).units();
        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Widget.marq", "Panel.UIML"]);
    }

    #[test]
    fn class_stem_strips_suffix_only() {
        let mut module = Module::new("demo");
        module.resources.push(resource("demo.Widget.marq"));
        let units = Catalog::new(&module).units();
        assert_eq!(units[0].class_stem(), "demo.Widget");
    }
}
