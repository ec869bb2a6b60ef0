//! Compile-time mapping from [`Framework`] to its implementations.

use std::sync::Arc;

use crate::builder::Builder;
use crate::bundler::Bundler;
use crate::compiler::{Compiler, RolldownCompiler};
use crate::framework::Framework;
use crate::frameworks::{
    ReactBuilder, ReactBundler, ReactImportMapGenerator, SvelteBuilder, SvelteBundler,
    SvelteImportMapGenerator, VueBuilder, VueBundler, VueImportMapGenerator,
};
use crate::import_map::ImportMapGenerator;
use crate::{Error, Result};

/// Owns the compiler shared by every builder and bundler it hands out.
#[derive(Clone)]
pub struct FrameworkRegistry {
    compiler: Arc<dyn Compiler>,
}

impl FrameworkRegistry {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        Self { compiler }
    }

    pub fn compiler(&self) -> &Arc<dyn Compiler> {
        &self.compiler
    }

    pub fn is_supported(&self, framework: Framework) -> bool {
        matches!(
            framework,
            Framework::React | Framework::Vue | Framework::Svelte
        )
    }

    pub fn get_builder(&self, framework: Framework) -> Result<Arc<dyn Builder>> {
        let compiler = self.compiler.clone();
        match framework {
            Framework::React => Ok(Arc::new(ReactBuilder::new(compiler))),
            Framework::Vue => Ok(Arc::new(VueBuilder::new(compiler))),
            Framework::Svelte => Ok(Arc::new(SvelteBuilder::new(compiler))),
            Framework::Solid | Framework::Preact => Err(Error::UnsupportedFramework(framework)),
        }
    }

    pub fn get_bundler(&self, framework: Framework) -> Result<Arc<dyn Bundler>> {
        let compiler = self.compiler.clone();
        match framework {
            Framework::React => Ok(Arc::new(ReactBundler::new(compiler))),
            Framework::Vue => Ok(Arc::new(VueBundler::new(compiler))),
            Framework::Svelte => Ok(Arc::new(SvelteBundler::new(compiler))),
            Framework::Solid | Framework::Preact => Err(Error::UnsupportedFramework(framework)),
        }
    }

    pub fn get_import_map_generator(
        &self,
        framework: Framework,
    ) -> Result<Arc<dyn ImportMapGenerator>> {
        match framework {
            Framework::React => Ok(Arc::new(ReactImportMapGenerator)),
            Framework::Vue => Ok(Arc::new(VueImportMapGenerator)),
            Framework::Svelte => Ok(Arc::new(SvelteImportMapGenerator)),
            Framework::Solid | Framework::Preact => Err(Error::UnsupportedFramework(framework)),
        }
    }
}

impl Default for FrameworkRegistry {
    fn default() -> Self {
        Self::new(Arc::new(RolldownCompiler::new()))
    }
}

impl std::fmt::Debug for FrameworkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameworkRegistry").finish_non_exhaustive()
    }
}
