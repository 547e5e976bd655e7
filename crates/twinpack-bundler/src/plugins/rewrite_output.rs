//! Restores dynamic `require` in ES module output.
//!
//! CommonJS dependencies bundled into an ES module keep their `require` calls.
//! Depending on the platform the bundler either routes them through a shim that
//! throws, or already binds `createRequire` from `node:module` itself. The
//! rewrite swaps a throwing shim for a call into a `require` created from
//! `import.meta.url`, and imports `createRequire` only when the module does not
//! bind it yet.

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::{NoExpand, Regex};

use super::BuildPlugin;
use crate::runtime::Runtime;
use crate::Result;

/// Import prepended when the module has no `createRequire` binding.
pub const CREATE_REQUIRE_PRELUDE: &str = "import {createRequire} from 'module';\n";

/// Statement that replaces the shim's `throw`.
pub const REQUIRE_DELEGATE: &str = "return createRequire(import.meta.url).apply(this, arguments);";

// esbuild-style and rolldown-style throwing shims.
static SHIM_THROW_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"throw\s+(?:new\s+)?Error\(\s*["'](?:Dynamic require of|Calling `require` for) [^;]*?\);?"#)
        .ok()
});

static CREATE_REQUIRE_BINDING_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*import\s*\{[^}]*\bcreateRequire\s*[,}][^;\n]*from\s*["'](?:node:)?module["']|\b(?:var|let|const|function)\s+createRequire\b"#,
    )
    .ok()
});

/// Text edits applied to the emitted module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DynamicRequireRewrite;

impl DynamicRequireRewrite {
    /// Rewrite `code`. Applying the result a second time changes nothing.
    pub fn apply(&self, code: &str) -> String {
        let body = match (*SHIM_THROW_RE).as_ref() {
            Some(re) => re.replacen(code, 1, NoExpand(REQUIRE_DELEGATE)).into_owned(),
            None => code.to_string(),
        };

        if self.binds_create_require(&body) {
            body
        } else {
            let mut out = String::with_capacity(CREATE_REQUIRE_PRELUDE.len() + body.len());
            out.push_str(CREATE_REQUIRE_PRELUDE);
            out.push_str(&body);
            out
        }
    }

    /// Whether a throwing `require` shim is present in `code`.
    pub fn has_shim(&self, code: &str) -> bool {
        (*SHIM_THROW_RE)
            .as_ref()
            .is_some_and(|re| re.is_match(code))
    }

    /// Whether `code` already declares or imports `createRequire`.
    pub fn binds_create_require(&self, code: &str) -> bool {
        (*CREATE_REQUIRE_BINDING_RE)
            .as_ref()
            .is_some_and(|re| re.is_match(code))
    }
}

/// End-of-build hook rewriting one emitted file in place.
#[derive(Debug)]
pub struct DynamicRequirePlugin {
    output: PathBuf,
    runtime: Arc<dyn Runtime>,
}

impl DynamicRequirePlugin {
    pub fn new(runtime: Arc<dyn Runtime>, output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            runtime,
        }
    }
}

#[async_trait]
impl BuildPlugin for DynamicRequirePlugin {
    fn name(&self) -> &str {
        "patch-dynamic-requires"
    }

    fn has_end_hook(&self) -> bool {
        true
    }

    async fn on_end(&self) -> Result<()> {
        let rewrite = DynamicRequireRewrite;
        let code = self.runtime.read_to_string(&self.output).await?;
        if !rewrite.has_shim(&code) {
            tracing::debug!(file = %self.output.display(), "no throwing require shim in output");
        }

        let rewritten = rewrite.apply(&code);
        if rewritten != code {
            self.runtime
                .write_file(&self.output, rewritten.as_bytes())
                .await?;
            tracing::debug!(file = %self.output.display(), "restored dynamic require");
        }
        Ok(())
    }
}
