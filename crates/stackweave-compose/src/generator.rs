//! Per-component configuration generation.
//!
//! Resolves the component's module contract, binds each referenced
//! dependency output to an input chosen by the [`VariableMapper`], and
//! renders the result with mock outputs for every dependency.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stackweave_common::config::{GeneratorConfig, StackConfig};
use stackweave_common::error::{Result, StackError};
use stackweave_common::types::{AssignmentValue, Component, ModuleIO, TypeTag, VariableDefinition};
use stackweave_registry::{RegistryClient, RegistryError};

use crate::graph::DependencyGraph;
use crate::hcl::{self, ConfigDocument, DependencyBlock, Expression, Include};
use crate::mapper::{MatchKind, VariableMapper};
use crate::mock;

/// A dependency output bound to an input of the generated configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Component producing the value.
    pub source_component: String,
    /// Output of the producing component.
    pub source_output: String,
    /// Input receiving the value.
    pub target_input: String,
    /// Mapper confidence in `[0, 1]`; `0` when no inference took place.
    pub confidence: f64,
    /// How the input was chosen.
    pub kind: MatchKind,
}

/// An input that was bound under a different name than declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rename {
    /// Input name used in the component declaration.
    pub declared_input: String,
    /// Input name emitted in the configuration.
    pub bound_input: String,
    /// `<component>.<output>` being bound.
    pub source: String,
}

/// Rendered configuration for one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedConfig {
    /// Component address.
    pub component: String,
    /// Rendered configuration text.
    pub text: String,
    /// Reference bindings in assignment order.
    pub bindings: Vec<Binding>,
    /// Bindings whose input name differs from the declared one.
    pub renames: Vec<Rename>,
    /// Set when the component's own module contract was unavailable.
    pub declared_only: bool,
    /// Dependency block names in first-reference order.
    pub dependencies: Vec<String>,
}

/// Generates configuration text for components of a graph.
#[derive(Clone)]
pub struct ConfigGenerator {
    registry: RegistryClient,
    mapper: VariableMapper,
    options: GeneratorConfig,
}

impl std::fmt::Debug for ConfigGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigGenerator")
            .field("mapper", &self.mapper)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Resolved contracts of the dependencies a component references.
struct DependencyContracts<'a> {
    registry: &'a RegistryClient,
    component: &'a str,
    resolved: HashMap<String, Option<Arc<ModuleIO>>>,
}

impl DependencyContracts<'_> {
    fn get(&mut self, graph: &DependencyGraph, address: &str) -> Result<Option<Arc<ModuleIO>>> {
        if let Some(io) = self.resolved.get(address) {
            return Ok(io.clone());
        }
        let Some(dependency) = graph.component(address) else {
            return Err(StackError::UnresolvedDependency {
                component: self.component.to_string(),
                reference: address.to_string(),
            });
        };
        let io = match self.registry.resolve(&dependency.module) {
            Ok(io) => Some(io),
            Err(RegistryError::Unavailable(reason)) => {
                tracing::warn!(
                    component = %self.component,
                    dependency = %address,
                    %reason,
                    "dependency contract unavailable: mocks fall back to untyped values"
                );
                None
            }
            Err(err) => return Err(err.into_stack_error(self.component, &dependency.module.key())),
        };
        let _ = self.resolved.insert(address.to_string(), io.clone());
        Ok(io)
    }
}

impl ConfigGenerator {
    /// Creates a generator.
    #[must_use]
    pub const fn new(registry: RegistryClient, mapper: VariableMapper, options: GeneratorConfig) -> Self {
        Self {
            registry,
            mapper,
            options,
        }
    }

    /// Creates a generator from the workspace configuration.
    #[must_use]
    pub fn from_config(registry: RegistryClient, config: &StackConfig) -> Self {
        Self::new(
            registry,
            VariableMapper::new(config.mapper.threshold),
            config.generator.clone(),
        )
    }

    /// Generation options.
    #[must_use]
    pub const fn options(&self) -> &GeneratorConfig {
        &self.options
    }

    /// Generates the configuration of `component` against `graph`.
    ///
    /// # Errors
    ///
    /// - `MissingModuleDefinition` if the registry has no contract for the
    ///   component's module or a referenced dependency's module.
    /// - `UnresolvedDependency` if an assignment references a component
    ///   absent from the graph.
    /// - `ConfigRender` if two assignments bind the same input or a name
    ///   cannot be rendered.
    pub fn generate(&self, component: &Component, graph: &DependencyGraph) -> Result<GeneratedConfig> {
        let address = component.address.as_str();
        let own = match self.registry.resolve(&component.module) {
            Ok(io) => Some(io),
            Err(RegistryError::Unavailable(reason)) => {
                tracing::warn!(component = %address, %reason, "registry unavailable, using declared input names");
                None
            }
            Err(err) => return Err(err.into_stack_error(address, &component.module.key())),
        };

        let declared: HashSet<&str> = component.assignments.iter().map(|(k, _)| k).collect();
        let mut bound: HashSet<String> = component
            .assignments
            .iter()
            .filter(|(_, v)| v.as_reference().is_none())
            .map(|(k, _)| k.to_string())
            .collect();

        let mut contracts = DependencyContracts {
            registry: &self.registry,
            component: address,
            resolved: HashMap::new(),
        };
        let mut blocks: Vec<DependencyBlock> = Vec::new();
        let mut inputs = Vec::with_capacity(component.assignments.len());
        let mut bindings = Vec::new();
        let mut renames = Vec::new();

        for (name, value) in component.assignments.iter() {
            let target = match value {
                AssignmentValue::Literal(literal) => {
                    inputs.push((name.to_string(), Expression::Literal(literal.clone())));
                    continue;
                }
                AssignmentValue::Reference { target } => target,
            };

            let dep_io = contracts.get(graph, &target.component)?;
            let source = dep_io
                .as_deref()
                .and_then(|io| io.outputs.get(&target.output).cloned())
                .unwrap_or_else(|| VariableDefinition::new(target.output.as_str(), TypeTag::Any, ""));

            let inferred = own
                .as_deref()
                .and_then(|io| self.mapper.infer_match(&source, &io.inputs))
                .filter(|m| m.target == name || (!bound.contains(&m.target) && !declared.contains(m.target.as_str())));
            let (bound_name, confidence, kind) = match inferred {
                Some(m) => (m.target, m.score, m.kind),
                None => (name.to_string(), 0.0, MatchKind::Declared),
            };
            if !bound.insert(bound_name.clone()) {
                return Err(StackError::ConfigRender {
                    component: address.to_string(),
                    message: format!("input \"{bound_name}\" is bound more than once"),
                });
            }
            if bound_name != name {
                tracing::info!(component = %address, declared = %name, bound = %bound_name, source = %target, "renamed input");
                renames.push(Rename {
                    declared_input: name.to_string(),
                    bound_input: bound_name.clone(),
                    source: target.to_string(),
                });
            }

            let mock_type = source.type_tag;
            let block = match blocks.iter().position(|b| b.name == target.component) {
                Some(i) => &mut blocks[i],
                None => {
                    blocks.push(DependencyBlock {
                        name: target.component.clone(),
                        config_path: format!("{}{}", self.options.config_path_prefix, target.component),
                        mock_outputs: Vec::new(),
                        allowed_commands: self.options.mock_allowed_commands.clone(),
                    });
                    let last = blocks.len() - 1;
                    &mut blocks[last]
                }
            };
            if !block.mock_outputs.iter().any(|(o, _)| *o == target.output) {
                block
                    .mock_outputs
                    .push((target.output.clone(), mock::mock_output(&target.output, mock_type)));
            }

            inputs.push((
                bound_name.clone(),
                Expression::DependencyOutput {
                    dependency: target.component.clone(),
                    output: target.output.clone(),
                },
            ));
            bindings.push(Binding {
                source_component: target.component.clone(),
                source_output: target.output.clone(),
                target_input: bound_name,
                confidence,
                kind,
            });
        }

        let dependencies = blocks.iter().map(|b| b.name.clone()).collect();
        let doc = ConfigDocument {
            includes: self.includes(),
            source: self
                .options
                .emit_source
                .then(|| component.module.source_address()),
            dependencies: blocks,
            inputs,
        };
        let text = hcl::render(&doc).map_err(|e| StackError::ConfigRender {
            component: address.to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!(component = %address, bindings = bindings.len(), renames = renames.len(), "generated config");
        Ok(GeneratedConfig {
            component: address.to_string(),
            text,
            bindings,
            renames,
            declared_only: own.is_none(),
            dependencies,
        })
    }

    fn includes(&self) -> Vec<Include> {
        vec![
            Include {
                label: "root".into(),
                file: self.options.root_include.clone(),
                expose: false,
            },
            Include {
                label: "provider".into(),
                file: self.options.provider_include.clone(),
                expose: true,
            },
        ]
    }
}

/// Generates the configuration of `component` with default options.
///
/// # Errors
///
/// See [`ConfigGenerator::generate`].
pub fn generate(component: &Component, graph: &DependencyGraph, registry: &RegistryClient) -> Result<GeneratedConfig> {
    ConfigGenerator::new(registry.clone(), VariableMapper::default(), GeneratorConfig::default())
        .generate(component, graph)
}
