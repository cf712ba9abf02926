//! Terraform-registry-compatible HTTP module source.
//!
//! Reads `GET {base}/v1/modules/{namespace}/{name}/{provider}[/{version}]`
//! and maps `root.inputs[]` / `root.outputs[]` into a [`ModuleIO`].

use serde::Deserialize;
use stackweave_common::config::RegistryConfig;
use stackweave_common::constants;
use stackweave_common::error::{Result, StackError};
use stackweave_common::types::{ModuleDescriptor, ModuleIO, TypeTag, VariableDefinition};

use crate::client::{ModuleRegistry, RegistryError};

#[derive(Debug, Deserialize)]
struct ModuleResponse {
    root: ModuleRoot,
}

#[derive(Debug, Deserialize)]
struct ModuleRoot {
    #[serde(default)]
    inputs: Vec<RegistryVariable>,
    #[serde(default)]
    outputs: Vec<RegistryVariable>,
}

#[derive(Debug, Deserialize)]
struct RegistryVariable {
    name: String,
    #[serde(rename = "type", default)]
    type_constraint: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    default: Option<serde_json::Value>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    sensitive: bool,
}

impl RegistryVariable {
    fn into_definition(self, infer_from_name: bool) -> VariableDefinition {
        let type_tag = match self.type_constraint.as_deref() {
            Some(c) if !c.is_empty() => TypeTag::from_constraint(c),
            _ if infer_from_name => infer_output_type(&self.name),
            _ => TypeTag::Any,
        };
        VariableDefinition {
            name: self.name,
            type_tag,
            description: self.description,
            default: self.default,
            required: self.required,
            sensitive: self.sensitive,
        }
    }
}

/// Guesses the type of an untyped output from its name.
///
/// Registry outputs usually carry no type constraint; plural identifier
/// names are lists, `enable_*`/`*_enabled` names are booleans.
#[must_use]
pub fn infer_output_type(name: &str) -> TypeTag {
    let lower = name.to_ascii_lowercase();
    let plural_suffixes = ["_ids", "_arns", "_names", "_subnets", "_cidrs", "_blocks", "_ips"];
    if lower.starts_with("enable") || lower.ends_with("_enabled") || lower.starts_with("is_") {
        TypeTag::Bool
    } else if plural_suffixes.iter().any(|s| lower.ends_with(s)) || lower == "subnets" {
        TypeTag::List
    } else if lower.ends_with("_tags") || lower == "tags" || lower.ends_with("_map") {
        TypeTag::Map
    } else {
        TypeTag::String
    }
}

/// Decodes a registry module response body.
///
/// # Errors
///
/// Returns `RegistryError::Unavailable` if the body is not a module document.
pub fn parse_module_response(body: &str) -> std::result::Result<ModuleIO, RegistryError> {
    let response: ModuleResponse = serde_json::from_str(body)
        .map_err(|e| RegistryError::Unavailable(format!("malformed registry response: {e}")))?;
    let inputs = response
        .root
        .inputs
        .into_iter()
        .map(|v| v.into_definition(false))
        .collect();
    let outputs = response
        .root
        .outputs
        .into_iter()
        .map(|v| v.into_definition(true))
        .collect();
    Ok(ModuleIO::from_lists(inputs, outputs))
}

/// A remote registry reached over blocking HTTP.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpRegistry {
    /// Creates a registry client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("{}/{}", constants::APP_NAME, env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StackError::Config {
                message: format!("failed to build registry HTTP client: {e}"),
            })?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Returns the module document URL for `descriptor`.
    #[must_use]
    pub fn module_url(&self, descriptor: &ModuleDescriptor) -> String {
        let mut url = format!(
            "{}/v1/modules/{}/{}/{}",
            self.base_url, descriptor.namespace, descriptor.name, descriptor.provider
        );
        if let Some(version) = &descriptor.version {
            url.push('/');
            url.push_str(version);
        }
        url
    }
}

impl ModuleRegistry for HttpRegistry {
    fn fetch(&self, descriptor: &ModuleDescriptor) -> std::result::Result<ModuleIO, RegistryError> {
        let url = self.module_url(descriptor);
        tracing::info!(url = %url, "querying module registry");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| RegistryError::Unavailable(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound);
        }
        if !status.is_success() {
            return Err(RegistryError::Unavailable(format!("HTTP {status} from {url}")));
        }

        let body = response
            .text()
            .map_err(|e| RegistryError::Unavailable(format!("failed to read body from {url}: {e}")))?;
        parse_module_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_url_includes_version_when_pinned() {
        let registry = HttpRegistry::new(&RegistryConfig {
            base_url: "https://registry.example.com/".into(),
            ..RegistryConfig::default()
        })
        .expect("client");
        let d = ModuleDescriptor::new("terraform-aws-modules", "vpc", "aws");
        assert_eq!(
            registry.module_url(&d),
            "https://registry.example.com/v1/modules/terraform-aws-modules/vpc/aws"
        );
        assert_eq!(
            registry.module_url(&d.with_version("5.1.0")),
            "https://registry.example.com/v1/modules/terraform-aws-modules/vpc/aws/5.1.0"
        );
    }

    #[test]
    fn parses_registry_document() {
        let body = r#"{
            "id": "terraform-aws-modules/vpc/aws/5.1.0",
            "root": {
                "inputs": [
                    {"name": "cidr", "type": "string", "description": "The IPv4 CIDR block for the VPC", "default": "\"10.0.0.0/16\"", "required": false},
                    {"name": "azs", "type": "list(string)", "description": "A list of availability zones", "required": true}
                ],
                "outputs": [
                    {"name": "vpc_id", "description": "The ID of the VPC"},
                    {"name": "private_subnets", "description": "List of IDs of private subnets"},
                    {"name": "enable_dns", "description": "Whether DNS is enabled"}
                ]
            }
        }"#;
        let io = parse_module_response(body).expect("parse");
        assert_eq!(io.inputs["azs"].type_tag, TypeTag::List);
        assert!(io.inputs["azs"].required);
        assert_eq!(io.outputs["vpc_id"].type_tag, TypeTag::String);
        assert_eq!(io.outputs["private_subnets"].type_tag, TypeTag::List);
        assert_eq!(io.outputs["enable_dns"].type_tag, TypeTag::Bool);
    }

    #[test]
    fn malformed_document_is_unavailable() {
        let err = parse_module_response("<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, RegistryError::Unavailable(_)));
    }

    #[test]
    fn infer_output_type_by_name() {
        assert_eq!(infer_output_type("database_subnets"), TypeTag::List);
        assert_eq!(infer_output_type("security_group_ids"), TypeTag::List);
        assert_eq!(infer_output_type("instance_arn"), TypeTag::String);
        assert_eq!(infer_output_type("tags"), TypeTag::Map);
    }
}
