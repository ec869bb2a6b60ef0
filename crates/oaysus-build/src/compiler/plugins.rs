//! Rolldown plugins used by [`RolldownCompiler`](super::RolldownCompiler).

use anyhow::Context;
use rolldown_common::{ModuleType, ResolvedExternal};
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs, HookResolveIdOutput,
    HookResolveIdReturn, HookTransformArgs, HookTransformOutput, HookTransformReturn, HookUsage,
    Plugin, PluginContext, SharedTransformPluginContext,
};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::{CompileTarget, ExternalPolicy};
use crate::framework::Framework;
use crate::tool::ToolCommand;

/// Marks specifiers matched by an [`ExternalPolicy`] as external.
///
/// Entry modules are never externalized.
#[derive(Debug, Clone)]
pub struct ExternalizePlugin {
    policy: Arc<ExternalPolicy>,
}

impl ExternalizePlugin {
    pub fn new(policy: ExternalPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl Plugin for ExternalizePlugin {
    fn name(&self) -> Cow<'static, str> {
        "oaysus-externalize".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let is_entry = args.importer.is_none();
        let policy = Arc::clone(&self.policy);

        async move {
            if is_entry || !policy.is_external(&specifier) {
                return Ok(None);
            }

            Ok(Some(HookResolveIdOutput {
                id: specifier.into(),
                external: Some(ResolvedExternal::Bool(true)),
                ..Default::default()
            }))
        }
    }
}

/// Replaces `process.env.NODE_ENV` with `"production"` in every module.
#[derive(Debug, Clone, Default)]
pub struct ProductionModePlugin;

const NODE_ENV_EXPR: &str = "process.env.NODE_ENV";

impl Plugin for ProductionModePlugin {
    fn name(&self) -> Cow<'static, str> {
        "oaysus-production-mode".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let code = args.code.to_string();

        async move {
            if !code.contains(NODE_ENV_EXPR) {
                return Ok(None);
            }

            Ok(Some(HookTransformOutput {
                code: Some(code.replace(NODE_ENV_EXPR, "\"production\"")),
                map: None,
                side_effects: None,
                module_type: None,
            }))
        }
    }
}

/// Compiles `.svelte` and `.vue` files with the framework's own compiler.
///
/// The compiler is loaded from the project's `node_modules` through a short
/// Node.js script, so the output matches the framework version the theme
/// declares.
#[derive(Debug, Clone)]
pub struct SfcCompilerPlugin {
    framework: Framework,
    target: CompileTarget,
    project_root: PathBuf,
    timeout_secs: u64,
}

/// JSON printed by the compile scripts.
#[derive(Debug, Deserialize)]
struct SfcOutput {
    code: String,
    #[serde(default)]
    lang: Option<String>,
}

const SVELTE_COMPILE_SCRIPT: &str = r#"
import { readFileSync } from 'node:fs';
import { compile, VERSION } from 'svelte/compiler';
const [file, target] = process.argv.slice(1);
const legacy = /^[34]\./.test(VERSION);
const generate = legacy ? (target === 'server' ? 'ssr' : 'dom') : target;
const result = compile(readFileSync(file, 'utf8'), {
  filename: file,
  generate,
  css: legacy ? (target === 'server' ? 'none' : 'injected') : 'injected',
  dev: false,
});
process.stdout.write(JSON.stringify({ code: result.js.code, lang: 'js' }));
"#;

const VUE_COMPILE_SCRIPT: &str = r#"
import { readFileSync } from 'node:fs';
import { createHash } from 'node:crypto';
import { parse, compileScript, compileTemplate, compileStyle } from '@vue/compiler-sfc';
const [file, target] = process.argv.slice(1);
const ssr = target === 'server';
const { descriptor, errors } = parse(readFileSync(file, 'utf8'), { filename: file });
if (errors.length) throw errors[0];
const id = createHash('sha256').update(file).digest('hex').slice(0, 8);
const scoped = descriptor.styles.some((s) => s.scoped);
const lang = (descriptor.scriptSetup || descriptor.script)?.lang === 'ts' ? 'ts' : 'js';
let code = '';
if (descriptor.script || descriptor.scriptSetup) {
  const script = compileScript(descriptor, {
    id,
    isProd: true,
    genDefaultAs: '_sfc_main',
    inlineTemplate: !!descriptor.scriptSetup,
    templateOptions: { ssr, ssrCssVars: [] },
  });
  code += script.content;
} else {
  code += 'const _sfc_main = {};';
}
if (descriptor.template && !descriptor.scriptSetup) {
  const tpl = compileTemplate({
    id, filename: file, source: descriptor.template.content, ssr, scoped,
    compilerOptions: { scopeId: scoped ? `data-v-${id}` : undefined },
  });
  const fn = ssr ? 'ssrRender' : 'render';
  code += '\n' + tpl.code.replace(`export function ${fn}`, `function ${fn}`);
  code += `\n_sfc_main.${fn} = ${fn};`;
}
if (scoped) code += `\n_sfc_main.__scopeId = 'data-v-${id}';`;
if (!ssr) {
  const css = descriptor.styles
    .map((s) => compileStyle({ id: `data-v-${id}`, filename: file, source: s.content, scoped: s.scoped }).code)
    .join('\n');
  if (css.trim()) {
    code += `\nif (typeof document !== 'undefined') { const s = document.createElement('style'); s.textContent = ${JSON.stringify(css)}; document.head.appendChild(s); }`;
  }
}
code += '\nexport default _sfc_main;';
process.stdout.write(JSON.stringify({ code, lang }));
"#;

impl SfcCompilerPlugin {
    pub fn new(
        framework: Framework,
        target: CompileTarget,
        project_root: impl Into<PathBuf>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            framework,
            target,
            project_root: project_root.into(),
            timeout_secs,
        }
    }

    fn script(&self) -> Option<(&'static str, &'static str)> {
        match self.framework {
            Framework::Svelte => Some((".svelte", SVELTE_COMPILE_SCRIPT)),
            Framework::Vue => Some((".vue", VUE_COMPILE_SCRIPT)),
            _ => None,
        }
    }

    fn target_arg(&self) -> &'static str {
        match self.target {
            CompileTarget::Browser => "client",
            CompileTarget::Server => "server",
        }
    }
}

impl Plugin for SfcCompilerPlugin {
    fn name(&self) -> Cow<'static, str> {
        "oaysus-sfc".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Load
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let script = self.script();
        let command = ToolCommand::new("node", &self.project_root)
            .timeout_secs(self.timeout_secs)
            .arg("--input-type=module")
            .arg("-e");
        let target = self.target_arg();

        async move {
            let Some((extension, source)) = script else {
                return Ok(None);
            };
            if !id.ends_with(extension) {
                return Ok(None);
            }

            debug!("Compiling {} for {}", id, target);
            let stdout = command
                .arg(source)
                .arg(id.clone())
                .arg(target)
                .run()
                .await
                .with_context(|| format!("Failed to compile {}", id))?;
            let output: SfcOutput = serde_json::from_str(&stdout)
                .with_context(|| format!("Unexpected compiler output for {}", id))?;

            let module_type = match output.lang.as_deref() {
                Some("ts") => ModuleType::Ts,
                _ => ModuleType::Js,
            };

            Ok(Some(HookLoadOutput {
                code: output.code.into(),
                module_type: Some(module_type),
                ..Default::default()
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sfc_plugin_only_claims_its_framework() {
        let svelte = SfcCompilerPlugin::new(Framework::Svelte, CompileTarget::Browser, ".", 30);
        let react = SfcCompilerPlugin::new(Framework::React, CompileTarget::Browser, ".", 30);

        assert_eq!(svelte.script().map(|(ext, _)| ext), Some(".svelte"));
        assert!(react.script().is_none());
        assert_eq!(svelte.target_arg(), "client");
    }

    #[test]
    fn test_sfc_output_parses() {
        let output: SfcOutput =
            serde_json::from_str(r#"{"code":"export default {}","lang":"ts"}"#).unwrap();
        assert_eq!(output.code, "export default {}");
        assert_eq!(output.lang.as_deref(), Some("ts"));
    }
}
