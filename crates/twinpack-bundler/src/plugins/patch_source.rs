//! Load-time text patches for third-party sources.
//!
//! A [`PatchSet`] is a named, versioned table of literal substitutions aimed at
//! one dependency file. [`PatchSourcePlugin`] intercepts the load of that file,
//! applies the table in order and hands the result to the bundler in place of
//! the file contents. Nothing is written to disk.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use super::BuildPlugin;
use crate::runtime::Runtime;
use crate::Result;

/// One literal substitution.
///
/// `search` is matched as an exact substring and only its first occurrence is
/// replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRule {
    pub id: &'static str,
    pub search: &'static str,
    pub replace: &'static str,
}

impl PatchRule {
    /// Apply to `source`. Returns `None` when the search literal is absent.
    pub fn apply(&self, source: &str) -> Option<String> {
        source
            .contains(self.search)
            .then(|| source.replacen(self.search, self.replace, 1))
    }
}

/// An ordered patch table for one dependency file.
#[derive(Debug, Clone)]
pub struct PatchSet {
    pub id: &'static str,
    /// Package the patched file belongs to.
    pub dependency: &'static str,
    /// Dependency versions the literals were taken from.
    pub version: &'static str,
    /// Module id pattern selecting the file.
    pub filter: &'static str,
    pub rules: &'static [PatchRule],
}

/// Outcome of [`PatchSet::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub code: String,
    /// Ids of rules whose search literal was not found.
    pub missed: Vec<&'static str>,
}

impl PatchSet {
    /// Apply every rule in order. Later rules see the output of earlier ones.
    pub fn apply(&self, source: &str) -> PatchOutcome {
        let mut code = source.to_string();
        let mut missed = Vec::new();

        for rule in self.rules {
            match rule.apply(&code) {
                Some(patched) => code = patched,
                None => missed.push(rule.id),
            }
        }

        PatchOutcome { code, missed }
    }

    /// Rules whose search literal does not occur in `source`.
    ///
    /// Rules are checked against the progressively patched text, the same way
    /// [`PatchSet::apply`] sees it.
    pub fn audit(&self, source: &str) -> Vec<&'static str> {
        self.apply(source).missed
    }

    /// Compile [`PatchSet::filter`].
    pub fn filter_regex(&self) -> Result<Regex> {
        Regex::new(self.filter).map_err(|e| {
            crate::Error::InvalidConfig(format!(
                "Invalid filter for patch set '{}': {}",
                self.id, e
            ))
        })
    }
}

/// Padding fix for template literal fragments in recast's reprinter
/// (benjamn/recast#611).
pub const RECAST_TEMPLATE_ELEMENT: PatchSet = PatchSet {
    id: "recast-611-template-element",
    dependency: "recast",
    version: "0.21 - 0.23",
    filter: r"recast/lib/patcher\.js$",
    rules: &[
        PatchRule {
            id: "leading-space",
            search: "var nls = needsLeadingSpace(lines, oldNode.loc, newLines);",
            replace: r#"var nls = oldNode.type !== "TemplateElement" && needsLeadingSpace(lines, oldNode.loc, newLines);"#,
        },
        PatchRule {
            id: "trailing-space",
            search: "var nts = needsTrailingSpace(lines, oldNode.loc, newLines)",
            replace: r#"var nts = oldNode.type !== "TemplateElement" && needsTrailingSpace(lines, oldNode.loc, newLines)"#,
        },
    ],
};

/// Load hook that applies a [`PatchSet`] to the matching module.
#[derive(Debug)]
pub struct PatchSourcePlugin {
    name: String,
    patches: PatchSet,
    filter: Regex,
    runtime: Arc<dyn Runtime>,
}

impl PatchSourcePlugin {
    /// Plugin for [`RECAST_TEMPLATE_ELEMENT`], named `patch-recast`.
    pub fn recast(runtime: Arc<dyn Runtime>) -> Result<Self> {
        Self::new("patch-recast", RECAST_TEMPLATE_ELEMENT, runtime)
    }

    pub fn new(name: impl Into<String>, patches: PatchSet, runtime: Arc<dyn Runtime>) -> Result<Self> {
        let filter = patches.filter_regex()?;
        Ok(Self {
            name: name.into(),
            patches,
            filter,
            runtime,
        })
    }

    /// Replace the default filter, e.g. with a project-configured pattern.
    pub fn with_filter(mut self, pattern: &str) -> Result<Self> {
        self.filter = Regex::new(pattern).map_err(|e| {
            crate::Error::InvalidConfig(format!("Invalid patch filter '{}': {}", pattern, e))
        })?;
        Ok(self)
    }
}

#[async_trait]
impl BuildPlugin for PatchSourcePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_filter(&self) -> Option<&Regex> {
        Some(&self.filter)
    }

    async fn on_load(&self, path: &Path) -> Result<Option<String>> {
        let source = self.runtime.read_to_string(path).await?;
        let outcome = self.patches.apply(&source);

        for rule in &outcome.missed {
            tracing::warn!(
                patch_set = self.patches.id,
                version = self.patches.version,
                rule = rule,
                file = %path.display(),
                "patch rule did not match; {} may have changed",
                self.patches.dependency
            );
        }

        Ok(Some(outcome.code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MemoryRuntime;
    use proptest::prelude::*;

    const PATCHER_EXCERPT: &str = "\
    if (needToPrintNewPathWithComments) {
        var nls = needsLeadingSpace(lines, oldNode.loc, newLines);
        var nts = needsTrailingSpace(lines, oldNode.loc, newLines);
    }";

    #[test]
    fn test_rules_rewrite_both_targets() {
        let outcome = RECAST_TEMPLATE_ELEMENT.apply(PATCHER_EXCERPT);

        assert!(outcome.missed.is_empty());
        assert!(outcome.code.contains(
            r#"var nls = oldNode.type !== "TemplateElement" && needsLeadingSpace(lines, oldNode.loc, newLines);"#
        ));
        assert!(outcome.code.contains(
            r#"var nts = oldNode.type !== "TemplateElement" && needsTrailingSpace(lines, oldNode.loc, newLines);"#
        ));
    }

    #[test]
    fn test_missing_literal_is_noop() {
        let source = "var nls = somethingElse();";
        let outcome = RECAST_TEMPLATE_ELEMENT.apply(source);

        assert_eq!(outcome.code, source);
        assert_eq!(outcome.missed, vec!["leading-space", "trailing-space"]);
    }

    #[test]
    fn test_only_first_occurrence_replaced() {
        let rule = PatchRule {
            id: "x",
            search: "a",
            replace: "b",
        };
        assert_eq!(rule.apply("aaa").as_deref(), Some("baa"));
    }

    #[test]
    fn test_later_rules_see_earlier_output() {
        const CHAINED: PatchSet = PatchSet {
            id: "chained",
            dependency: "dep",
            version: "*",
            filter: r"dep\.js$",
            rules: &[
                PatchRule { id: "one", search: "foo", replace: "bar" },
                PatchRule { id: "two", search: "bar", replace: "baz" },
            ],
        };
        assert_eq!(CHAINED.apply("foo").code, "baz");
    }

    #[test]
    fn test_filter_matches_recast_patcher_only() {
        let filter = RECAST_TEMPLATE_ELEMENT.filter_regex().unwrap();
        assert!(filter.is_match("/project/node_modules/recast/lib/patcher.js"));
        assert!(!filter.is_match("/project/node_modules/recast/lib/printer.js"));
        assert!(!filter.is_match("/project/node_modules/recast/lib/patcher.js.map"));
    }

    #[tokio::test]
    async fn test_plugin_returns_patched_override() {
        let runtime = Arc::new(MemoryRuntime::new("/project"));
        runtime.add_file("node_modules/recast/lib/patcher.js", PATCHER_EXCERPT);
        let plugin = PatchSourcePlugin::recast(runtime.clone()).unwrap();

        let code = plugin
            .on_load(Path::new("/project/node_modules/recast/lib/patcher.js"))
            .await
            .unwrap()
            .unwrap();

        assert!(code.contains(r#"oldNode.type !== "TemplateElement" && needsLeadingSpace"#));
        // Source on disk untouched.
        assert_eq!(
            runtime.file_text("node_modules/recast/lib/patcher.js").as_deref(),
            Some(PATCHER_EXCERPT)
        );
    }

    #[tokio::test]
    async fn test_plugin_passes_through_unmatched_source() {
        let runtime = Arc::new(MemoryRuntime::new("/project"));
        runtime.add_file("node_modules/recast/lib/patcher.js", "module.exports = {};");
        let plugin = PatchSourcePlugin::recast(runtime).unwrap();

        let code = plugin
            .on_load(Path::new("/project/node_modules/recast/lib/patcher.js"))
            .await
            .unwrap();

        assert_eq!(code.as_deref(), Some("module.exports = {};"));
        assert_eq!(RECAST_TEMPLATE_ELEMENT.version, "0.21 - 0.23");
    }

    #[test]
    fn test_custom_filter_is_validated() {
        let runtime = Arc::new(MemoryRuntime::new("/project"));
        let plugin = PatchSourcePlugin::recast(runtime).unwrap();
        assert!(plugin.with_filter("(unclosed").is_err());
    }

    proptest! {
        #[test]
        fn prop_text_without_literals_is_unchanged(source in "[a-zA-Z0-9 ;=(){}\n]{0,200}") {
            prop_assume!(!source.contains("needsLeadingSpace") && !source.contains("needsTrailingSpace"));
            let outcome = RECAST_TEMPLATE_ELEMENT.apply(&source);
            prop_assert_eq!(outcome.code, source);
        }
    }
}
