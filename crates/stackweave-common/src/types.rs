//! Domain primitive types used across the Stackweave workspace.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, StackError};

/// Identity of a module: `(namespace, name, provider)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleKey {
    /// Registry namespace (publisher).
    pub namespace: String,
    /// Module name.
    pub name: String,
    /// Target provider.
    pub provider: String,
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.name, self.provider)
    }
}

/// A reference to a reusable module in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Registry namespace (publisher).
    pub namespace: String,
    /// Module name.
    pub name: String,
    /// Target provider.
    pub provider: String,
    /// Pinned version, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ModuleDescriptor {
    /// Creates an unversioned descriptor.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            provider: provider.into(),
            version: None,
            description: String::new(),
        }
    }

    /// Parses a `namespace/name/provider` source string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string does not have exactly three non-empty segments.
    pub fn parse(source: &str) -> Result<Self> {
        let parts: Vec<&str> = source.split('/').collect();
        match parts.as_slice() {
            [ns, name, provider]
                if !ns.is_empty() && !name.is_empty() && !provider.is_empty() =>
            {
                Ok(Self::new(*ns, *name, *provider))
            }
            _ => Err(StackError::Config {
                message: format!("invalid module source \"{source}\": expected namespace/name/provider"),
            }),
        }
    }

    /// Returns a copy pinned to `version`.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Returns the cache identity of this descriptor. Version is not part of it.
    #[must_use]
    pub fn key(&self) -> ModuleKey {
        ModuleKey {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            provider: self.provider.clone(),
        }
    }

    /// Renders the registry source address used in a `terraform` block.
    #[must_use]
    pub fn source_address(&self) -> String {
        let base = format!("tfr:///{}/{}/{}", self.namespace, self.name, self.provider);
        match &self.version {
            Some(v) => format!("{base}?version={v}"),
            None => base,
        }
    }
}

impl fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Semantic type tag of a module variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    /// `string`
    String,
    /// `number`
    Number,
    /// `bool`
    Bool,
    /// `list(...)` or `tuple(...)`
    List,
    /// `set(...)`
    Set,
    /// `map(...)`
    Map,
    /// `object({...})`
    Object,
    /// `any` or an unrecognized constraint.
    #[default]
    Any,
}

impl TypeTag {
    /// All type tags, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::String,
        Self::Number,
        Self::Bool,
        Self::List,
        Self::Set,
        Self::Map,
        Self::Object,
        Self::Any,
    ];

    /// Parses a type constraint such as `list(string)`. Never fails.
    #[must_use]
    pub fn from_constraint(constraint: &str) -> Self {
        let normalized = constraint.trim().to_ascii_lowercase();
        let head = normalized
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        match head {
            "string" => Self::String,
            "number" => Self::Number,
            "bool" => Self::Bool,
            "list" | "tuple" => Self::List,
            "set" => Self::Set,
            "map" => Self::Map,
            "object" => Self::Object,
            _ => Self::Any,
        }
    }

    /// Whether values of this type are ordered or unordered sequences.
    #[must_use]
    pub const fn is_list_like(self) -> bool {
        matches!(self, Self::List | Self::Set)
    }

    /// Whether values of this type are key-value structures.
    #[must_use]
    pub const fn is_map_like(self) -> bool {
        matches!(self, Self::Map | Self::Object)
    }

    /// Whether values of this type are booleans.
    #[must_use]
    pub const fn is_bool_like(self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
            Self::Object => "object",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_constraint(s))
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_constraint(&raw))
    }
}

/// An input or output declared by a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Variable name.
    pub name: String,
    /// Semantic type tag.
    #[serde(rename = "type", default)]
    pub type_tag: TypeTag,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Default value, if the module declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Whether the caller must provide a value.
    #[serde(default)]
    pub required: bool,
    /// Whether the value is sensitive.
    #[serde(default)]
    pub sensitive: bool,
}

impl VariableDefinition {
    /// Creates an optional, non-sensitive variable.
    #[must_use]
    pub fn new(name: impl Into<String>, type_tag: TypeTag, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag,
            description: description.into(),
            default: None,
            required: false,
            sensitive: false,
        }
    }

    /// Marks the variable as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The input/output contract of a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleIO {
    /// Inputs keyed by name.
    #[serde(default)]
    pub inputs: BTreeMap<String, VariableDefinition>,
    /// Outputs keyed by name.
    #[serde(default)]
    pub outputs: BTreeMap<String, VariableDefinition>,
}

impl ModuleIO {
    /// Builds a contract from input and output lists.
    #[must_use]
    pub fn from_lists(inputs: Vec<VariableDefinition>, outputs: Vec<VariableDefinition>) -> Self {
        Self {
            inputs: inputs.into_iter().map(|v| (v.name.clone(), v)).collect(),
            outputs: outputs.into_iter().map(|v| (v.name.clone(), v)).collect(),
        }
    }
}

/// A `<component>.<output>` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OutputRef {
    /// Referenced component address.
    pub component: String,
    /// Referenced output name.
    pub output: String,
}

impl OutputRef {
    /// Parses `<component>.<output>`.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input has exactly one dot with non-empty sides.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.split_once('.') {
            Some((component, output))
                if !component.is_empty() && !output.is_empty() && !output.contains('.') =>
            {
                Ok(Self {
                    component: component.to_string(),
                    output: output.to_string(),
                })
            }
            _ => Err(StackError::Config {
                message: format!("invalid output reference \"{raw}\": expected <component>.<output>"),
            }),
        }
    }
}

impl TryFrom<String> for OutputRef {
    type Error = StackError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<OutputRef> for String {
    fn from(value: OutputRef) -> Self {
        format!("{}.{}", value.component, value.output)
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.output)
    }
}

/// The value assigned to a component input.
///
/// A map whose only key is `ref` is always a reference; a malformed target is
/// an error rather than a literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AssignmentValue {
    /// Wiring to another component's output, written `{"ref": "vpc.vpc_id"}`.
    Reference {
        /// Referenced output.
        #[serde(rename = "ref")]
        target: OutputRef,
    },
    /// A literal value.
    Literal(serde_json::Value),
}

impl AssignmentValue {
    /// Shorthand for a reference assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not a valid `<component>.<output>` reference.
    pub fn reference(raw: &str) -> Result<Self> {
        Ok(Self::Reference {
            target: OutputRef::parse(raw)?,
        })
    }

    /// Returns the referenced output, if this is a reference.
    #[must_use]
    pub const fn as_reference(&self) -> Option<&OutputRef> {
        match self {
            Self::Reference { target } => Some(target),
            Self::Literal(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for AssignmentValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let serde_json::Value::Object(map) = &value else {
            return Ok(Self::Literal(value));
        };
        if map.len() != 1 {
            return Ok(Self::Literal(value));
        }
        let Some(raw) = map.get("ref") else {
            return Ok(Self::Literal(value));
        };
        let raw = raw.as_str().ok_or_else(|| {
            serde::de::Error::custom(StackError::Config {
                message: format!("output reference must be a string, got {raw}"),
            })
        })?;
        let target = OutputRef::parse(raw).map_err(serde::de::Error::custom)?;
        Ok(Self::Reference { target })
    }
}

/// Input assignments of a component, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignments(Vec<(String, AssignmentValue)>);

impl Assignments {
    /// Creates an empty assignment list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Sets `input`, replacing any earlier assignment in place.
    pub fn insert(&mut self, input: impl Into<String>, value: AssignmentValue) {
        let input = input.into();
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == input) {
            slot.1 = value;
        } else {
            self.0.push((input, value));
        }
    }

    /// Iterates assignments in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AssignmentValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates only the reference assignments, in declaration order.
    pub fn references(&self) -> impl Iterator<Item = (&str, &OutputRef)> {
        self.iter()
            .filter_map(|(k, v)| v.as_reference().map(|r| (k, r)))
    }

    /// Number of assignments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no assignments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, AssignmentValue)> for Assignments {
    fn from_iter<I: IntoIterator<Item = (String, AssignmentValue)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

impl Serialize for Assignments {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de> Deserialize<'de> for Assignments {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = Assignments;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of input name to value")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut out = Assignments::new();
                while let Some((k, v)) = map.next_entry::<String, AssignmentValue>()? {
                    out.insert(k, v);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Declared importance of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    /// Failure has little impact.
    Low,
    /// Failure degrades part of the stack.
    Medium,
    /// Failure takes down dependent services.
    High,
    /// Failure takes down the stack.
    Critical,
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A named, deployable infrastructure unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Unique address within the stack.
    pub address: String,
    /// Module this component instantiates.
    pub module: ModuleDescriptor,
    /// Explicitly declared dependencies (component addresses).
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Input assignments.
    #[serde(default)]
    pub assignments: Assignments,
    /// Source path queried for change history; defaults to the address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Declared criticality, overriding the graph-derived tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<Criticality>,
}

impl Component {
    /// Creates a component with no dependencies or assignments.
    #[must_use]
    pub fn new(address: impl Into<String>, module: ModuleDescriptor) -> Self {
        Self {
            address: address.into(),
            module,
            dependencies: Vec::new(),
            assignments: Assignments::new(),
            path: None,
            criticality: None,
        }
    }

    /// Adds an explicit dependency.
    #[must_use]
    pub fn depends_on(mut self, address: impl Into<String>) -> Self {
        self.dependencies.push(address.into());
        self
    }

    /// Adds an input assignment.
    #[must_use]
    pub fn assign(mut self, input: impl Into<String>, value: AssignmentValue) -> Self {
        self.assignments.insert(input, value);
        self
    }

    /// Returns the path used for history lookups.
    #[must_use]
    pub fn history_path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.address)
    }
}

/// Planned action for a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeAction {
    /// Resource will be created.
    Create,
    /// Resource will be updated in place.
    Update,
    /// Resource will be destroyed.
    Delete,
    /// Resource will be destroyed and recreated.
    Replace,
    /// No change planned.
    #[serde(alias = "no-op")]
    NoChange,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Replace => write!(f, "replace"),
            Self::NoChange => write!(f, "no-change"),
        }
    }
}

/// One planned change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// Component address.
    pub address: String,
    /// Planned action.
    pub action: ChangeAction,
}

impl ChangeEntry {
    /// Creates a change entry.
    #[must_use]
    pub fn new(address: impl Into<String>, action: ChangeAction) -> Self {
        Self {
            address: address.into(),
            action,
        }
    }
}

/// Ordered list of planned changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Changes in plan order.
    #[serde(default)]
    pub changes: Vec<ChangeEntry>,
}

impl ChangeSet {
    /// Creates a change set from entries.
    #[must_use]
    pub const fn new(changes: Vec<ChangeEntry>) -> Self {
        Self { changes }
    }

    /// Returns the first planned action for `address`.
    #[must_use]
    pub fn action_for(&self, address: &str) -> Option<ChangeAction> {
        self.changes
            .iter()
            .find(|c| c.address == address)
            .map(|c| c.action)
    }
}
