//! Discovery of markup-tagged types in loaded modules.

use tracing::warn;

use marq_core::markup::FileSource;
use marq_core::module::{Module, TypeDef};

use crate::error::JitError;

/// Scan `module` for discovery tags and resolve each tagged markup unit.
///
/// The sequence is lazy, finite and restartable (each call rescans). Content
/// is resolved from the module's own embedded resources first, then from the
/// secondary well-known `fallback` module; absent in both it yields
/// [`JitError::MissingResource`]. A tag naming a type the module no longer
/// carries is skipped with a warning.
pub fn discover<'a>(
    module: &'a Module,
    fallback: Option<&'a Module>,
) -> impl Iterator<Item = Result<(TypeDef, FileSource), JitError>> + 'a {
    module.tags.iter().filter_map(move |tag| {
        let ty = match module.find_type(&tag.type_name) {
            Some(ty) => ty.clone(),
            None => {
                warn!(type_name = %tag.type_name, "discovery tag for unknown type; skipped");
                return None;
            }
        };

        let resource = module
            .find_resource(&tag.path)
            .or_else(|| fallback.and_then(|m| m.find_resource(&tag.path)));

        Some(match resource {
            Some(res) => Ok((
                ty,
                FileSource {
                    path: res.path.clone(),
                    uri: tag.uri.clone(),
                    contents: res.contents.clone(),
                },
            )),
            None => Err(JitError::MissingResource(tag.path.clone())),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use marq_core::module::DiscoveryTag;
    use marq_test::{add_markup, sample_module};

    fn tag(module: &mut Module) {
        module.tags.push(DiscoveryTag {
            type_name: "demo.Widget".to_owned(),
            path: "demo/demo.Widget.marq".to_owned(),
            uri: "res:demo.Widget.marq?module=demo".to_owned(),
        });
    }

    #[test]
    fn resolves_tagged_content_from_own_resources() {
        let mut module = sample_module();
        tag(&mut module);

        let found: Vec<_> = discover(&module, None).collect();
        assert_eq!(found.len(), 1);
        let (ty, source) = found.into_iter().next().unwrap().unwrap();
        assert_eq!(ty.name, "demo.Widget");
        assert_eq!(source.path, "demo/demo.Widget.marq");
        assert!(!source.contents.is_empty());
    }

    #[test]
    fn falls_back_to_secondary_catalog() {
        let mut module = sample_module();
        module.resources.clear();
        tag(&mut module);

        let mut shared = Module::new("demo");
        add_markup(&mut shared, "demo.Widget.marq", "margin = 4");

        let item = discover(&module, Some(&shared)).next().unwrap().unwrap();
        assert_eq!(item.1.contents, b"margin = 4");
    }

    #[test]
    fn missing_everywhere_is_an_error() {
        let mut module = sample_module();
        module.resources.clear();
        tag(&mut module);

        let item = discover(&module, None).next().unwrap();
        assert!(matches!(item, Err(JitError::MissingResource(_))));
    }

    #[test]
    fn restartable_sequence_rescans() {
        let mut module = sample_module();
        tag(&mut module);

        assert_eq!(discover(&module, None).count(), 1);
        assert_eq!(discover(&module, None).count(), 1);
    }
}
