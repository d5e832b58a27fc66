//! Artifact-kind dispatch: turn a build request into build statements.

use std::path::Path;

use serde::{Deserialize, Serialize};

use ntc_targets::{Architecture, ArtifactKind, BuildConfig};

use crate::error::{Result, ToolchainError};
use crate::toolchain::{LocalOptions, Toolchain};
use crate::writer::{BuildStatement, BuildWriter};

/// The emitter an artifact kind maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emitter {
    /// Compile one source with the backend's compile rule.
    Compile,
    /// Archive objects with the `ar` rule.
    Archive,
    /// Link with the named rule (`so` or `link`).
    Link(&'static str),
    /// Run the base kind's emitter once per architecture.
    FanOut(ArtifactKind),
}

impl Emitter {
    pub fn for_kind(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Object => Emitter::Compile,
            ArtifactKind::StaticLib => Emitter::Archive,
            ArtifactKind::SharedLib => Emitter::Link("so"),
            ArtifactKind::Executable => Emitter::Link("link"),
            ArtifactKind::MultiStaticLib
            | ArtifactKind::MultiSharedLib
            | ArtifactKind::MultiExecutable => Emitter::FanOut(kind.base()),
        }
    }
}

/// One requested build output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub kind: ArtifactKind,
    pub config: BuildConfig,
    /// Exactly one architecture for base kinds; one or more for `Multi*`.
    pub archs: Vec<Architecture>,
    /// Inputs. For `Multi*` kinds each input is scoped per architecture
    /// the same way as the output.
    pub inputs: Vec<String>,
    pub output: String,
    #[serde(default)]
    pub options: LocalOptions,
}

/// `dir/file` → `dir/<arch>/file`.
pub fn arch_scoped(path: &str, arch: Architecture) -> String {
    let path = Path::new(path);
    let file = path.file_name().unwrap_or(path.as_os_str());
    match path.parent() {
        Some(dir) => dir.join(arch.tag()).join(file).display().to_string(),
        None => Path::new(arch.tag()).join(file).display().to_string(),
    }
}

/// Emit the statements for `request`, returning every output produced.
///
/// Every statement is composed before any is written, so a failing
/// request leaves `writer` untouched.
pub fn build(
    toolchain: &dyn Toolchain,
    writer: &mut dyn BuildWriter,
    request: &BuildRequest,
) -> Result<Vec<String>> {
    validate(toolchain, request)?;
    let statements = compose(toolchain, request)?;
    let mut outputs = Vec::with_capacity(statements.len());
    for statement in &statements {
        writer.build(statement)?;
        outputs.extend(statement.outputs.iter().cloned());
    }
    Ok(outputs)
}

/// Reject architectures and configurations the toolchain was not set up for.
fn validate(toolchain: &dyn Toolchain, request: &BuildRequest) -> Result<()> {
    let ctx = toolchain.context();
    let invalid = |detail: String| ToolchainError::InvalidRequest {
        output: request.output.clone(),
        detail,
    };

    if !ctx.configs.contains(&request.config) {
        return Err(invalid(format!(
            "configuration '{}' is not enabled for this toolchain",
            request.config
        )));
    }
    for (i, arch) in request.archs.iter().enumerate() {
        if !ctx.archs.contains(arch) {
            return Err(invalid(format!(
                "architecture '{arch}' is not enabled for this toolchain"
            )));
        }
        if request.archs[..i].contains(arch) {
            return Err(invalid(format!("architecture '{arch}' is listed twice")));
        }
    }
    Ok(())
}

fn compose(toolchain: &dyn Toolchain, request: &BuildRequest) -> Result<Vec<BuildStatement>> {
    let invalid = |detail: &str| ToolchainError::InvalidRequest {
        output: request.output.clone(),
        detail: detail.into(),
    };

    match Emitter::for_kind(request.kind) {
        Emitter::FanOut(base) => {
            if request.archs.is_empty() {
                return Err(invalid("no architectures requested"));
            }
            let mut statements = Vec::with_capacity(request.archs.len() + 1);
            for &arch in &request.archs {
                let inputs = request.inputs.iter().map(|i| arch_scoped(i, arch)).collect();
                statements.push(statement_for(
                    toolchain,
                    base,
                    request.config,
                    arch,
                    inputs,
                    arch_scoped(&request.output, arch),
                    &request.options,
                )?);
            }
            let per_arch: Vec<String> = statements
                .iter()
                .flat_map(|s| s.outputs.iter().cloned())
                .collect();
            if let Some(merge) = toolchain.merge_statement(&per_arch, &request.output) {
                statements.push(merge);
            }
            Ok(statements)
        }
        _ => {
            let [arch] = request.archs.as_slice() else {
                return Err(invalid("exactly one architecture is required"));
            };
            let statement = statement_for(
                toolchain,
                request.kind,
                request.config,
                *arch,
                request.inputs.clone(),
                request.output.clone(),
                &request.options,
            )?;
            Ok(vec![statement])
        }
    }
}

/// Compose the statement for a base kind on one architecture.
fn statement_for(
    toolchain: &dyn Toolchain,
    kind: ArtifactKind,
    config: BuildConfig,
    arch: Architecture,
    inputs: Vec<String>,
    output: String,
    options: &LocalOptions,
) -> Result<BuildStatement> {
    let (rule, variables) = match Emitter::for_kind(kind) {
        Emitter::Compile => {
            let [input] = &inputs[..] else {
                return Err(ToolchainError::InvalidRequest {
                    output,
                    detail: format!("an object needs one source, got {}", inputs.len()),
                });
            };
            (
                toolchain.compile_rule(input),
                toolchain.compile_variables(config, arch, kind, options)?,
            )
        }
        Emitter::Archive => ("ar", toolchain.archive_variables(config, arch, kind, options)?),
        Emitter::Link(rule) => (
            rule,
            toolchain.link_variables(config, arch, kind, options, &output)?,
        ),
        Emitter::FanOut(_) => {
            return Err(ToolchainError::InvalidRequest {
                output,
                detail: format!("{kind} cannot be nested in a fan-out"),
            })
        }
    };

    tracing::trace!(%output, rule, %arch, %config, "build statement");
    Ok(BuildStatement {
        outputs: vec![output],
        rule: rule.into(),
        inputs,
        implicit: options.implicit_deps.clone(),
        variables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_one_emitter() {
        for kind in ArtifactKind::ALL {
            match Emitter::for_kind(kind) {
                Emitter::FanOut(base) => {
                    assert!(kind.is_multi());
                    assert!(!matches!(Emitter::for_kind(base), Emitter::FanOut(_)));
                }
                _ => assert!(!kind.is_multi()),
            }
        }
    }

    #[test]
    fn scoping_inserts_arch_directory() {
        assert_eq!(arch_scoped("bin/app", Architecture::Arm64), "bin/arm64/app");
        assert_eq!(arch_scoped("libfoo.a", Architecture::X86), "x86/libfoo.a");
    }
}
