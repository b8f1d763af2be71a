use std::collections::BTreeSet;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::asset::ShaderAsset;
use crate::error::{Result, ShaderCompilationError};
use crate::gpu::{GpuBackend, ObjectCache, ProgramHandle, ProgramStage, SurfaceGeneration, Tagged};

use super::{parse_info_log, ShaderMetadata};

/// Backend location of an active uniform.
///
/// [`NOT_FOUND`](Self::NOT_FOUND) marks a uniform the compiler dropped; setting
/// it is a no-op.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

impl UniformLocation {
    pub const NOT_FOUND: Self = Self(-1);

    #[inline]
    pub fn is_found(self) -> bool {
        self.0 >= 0
    }

    /// Slot index for backends that address uniforms by table position.
    #[inline]
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

/// A linked program and its active uniforms.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    handle: ProgramHandle,
    uniforms: FxHashMap<String, UniformLocation>,
}

impl Program {
    /// `uniforms` may carry array suffixes (`lights[0]`); they are stripped.
    pub fn new(handle: ProgramHandle, uniforms: FxHashMap<String, UniformLocation>) -> Self {
        let uniforms = uniforms
            .into_iter()
            .map(|(name, loc)| (base_name(&name).to_string(), loc))
            .collect();
        Self { handle, uniforms }
    }

    #[inline]
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Location of `name`, or [`UniformLocation::NOT_FOUND`].
    pub fn locate(&self, name: &str) -> UniformLocation {
        self.uniforms
            .get(name)
            .copied()
            .unwrap_or(UniformLocation::NOT_FOUND)
    }

    pub fn active_uniform_names(&self) -> BTreeSet<String> {
        self.uniforms.keys().cloned().collect()
    }

    pub fn metadata(&self) -> ShaderMetadata {
        ShaderMetadata {
            active_uniforms: self.active_uniform_names(),
        }
    }
}

impl Tagged for Program {
    fn generation(&self) -> SurfaceGeneration {
        self.handle.generation()
    }
}

fn base_name(name: &str) -> &str {
    name.split_once('[').map_or(name, |(base, _)| base)
}

/// Programs keyed by their (vertex, fragment) source pair.
pub struct ShaderCache {
    cache: ObjectCache<ShaderAsset, Arc<Program>>,
}

impl ShaderCache {
    pub fn new() -> Self {
        Self {
            cache: ObjectCache::new("shader"),
        }
    }

    /// Compiles and links `shader` on first request, then returns the cached program.
    pub fn get<B: GpuBackend + ?Sized>(
        &mut self,
        shader: &ShaderAsset,
        generation: SurfaceGeneration,
        backend: &mut B,
    ) -> Result<&Arc<Program>> {
        self.cache.resolve_or_create(shader, generation, |shader| {
            let compiled = backend.compile_program(shader).map_err(|err| {
                let message = match err.stage {
                    ProgramStage::Vertex | ProgramStage::Fragment => "Shader compilation failed.",
                    ProgramStage::Link => "Shader program linking failed.",
                };
                log::error!("{message} ({:?} stage)\n{}", err.stage, err.log);
                ShaderCompilationError {
                    message: message.to_string(),
                    locations: parse_info_log(&err.log),
                    details: err.log,
                }
            })?;

            Ok(Arc::new(Program::new(
                ProgramHandle::new(compiled.handle, generation),
                compiled.uniforms,
            )))
        })
    }

    pub fn destroy(&mut self) -> usize {
        self.cache.destroy()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for ShaderCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::gpu::testing::RecordingBackend;

    fn shader(fs: &str) -> ShaderAsset {
        ShaderAsset::new("vs", fs)
    }

    // ── caching ───────────────────────────────────────────────────────────

    #[test]
    fn equal_sources_compile_once() {
        let mut backend = RecordingBackend::new();
        let mut cache = ShaderCache::new();
        let r#gen = SurfaceGeneration::default();

        let a = Arc::clone(cache.get(&shader("fs"), r#gen, &mut backend).unwrap());
        let b = Arc::clone(cache.get(&shader("fs"), r#gen, &mut backend).unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(backend.count("compile_program"), 1);
    }

    #[test]
    fn new_generation_recompiles() {
        let mut backend = RecordingBackend::new();
        let mut cache = ShaderCache::new();
        let r#gen = SurfaceGeneration::default();

        let a = cache.get(&shader("fs"), r#gen, &mut backend).unwrap().handle();
        let b = cache.get(&shader("fs"), r#gen.next(), &mut backend).unwrap().handle();

        assert_ne!(a, b);
        assert_eq!(backend.count("compile_program"), 2);
    }

    // ── locations ─────────────────────────────────────────────────────────

    #[test]
    fn array_suffixes_are_stripped_and_missing_names_are_not_found() {
        let mut uniforms = FxHashMap::default();
        uniforms.insert("time".to_string(), UniformLocation(0));
        uniforms.insert("lights[0]".to_string(), UniformLocation(1));
        let program = Program::new(ProgramHandle::new(1, SurfaceGeneration::default()), uniforms);

        assert_eq!(program.locate("time"), UniformLocation(0));
        assert_eq!(program.locate("lights"), UniformLocation(1));
        assert_eq!(program.locate("resolution"), UniformLocation::NOT_FOUND);
        assert!(!program.locate("resolution").is_found());
        assert!(program.metadata().is_active("lights"));
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn compile_failure_is_structured() {
        let mut backend = RecordingBackend::new();
        backend.fail_compile(
            ProgramStage::Fragment,
            "ERROR: 0:12: 'x' : syntax error\nsome garbage",
        );
        let mut cache = ShaderCache::new();

        let err = cache
            .get(&shader("broken"), SurfaceGeneration::default(), &mut backend)
            .unwrap_err();
        let diag = err.shader_diagnostics().unwrap();

        assert_eq!(diag.message, "Shader compilation failed.");
        assert_eq!(diag.locations.len(), 2);
        assert_eq!(diag.locations[0].line, 12);
        assert_eq!(diag.locations[0].message, "'x' : syntax error");
        assert_eq!(diag.locations[1].line, -1);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn link_failure_has_its_own_summary() {
        let mut backend = RecordingBackend::new();
        backend.fail_compile(ProgramStage::Link, "varying mismatch");
        let mut cache = ShaderCache::new();

        let err = cache
            .get(&shader("fs"), SurfaceGeneration::default(), &mut backend)
            .unwrap_err();
        match err {
            EngineError::ShaderCompilation(e) => {
                assert_eq!(e.message, "Shader program linking failed.");
                assert_eq!(e.details, "varying mismatch");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
