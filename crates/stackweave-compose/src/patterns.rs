//! Known infrastructure wiring patterns.
//!
//! Each pattern names the description terms that signal it, the variable
//! types it usually carries, and the module input names that typically
//! consume it.

use stackweave_common::types::TypeTag;

/// A recurring way infrastructure modules are wired together.
#[derive(Debug, Clone, Copy)]
pub struct InfraPattern {
    /// Pattern name.
    pub name: &'static str,
    /// Description terms that indicate this pattern.
    pub keywords: &'static [&'static str],
    /// Types commonly carried by variables in this pattern.
    pub common_types: &'static [TypeTag],
    /// Input names that usually receive values of this pattern.
    pub related_inputs: &'static [&'static str],
}

impl InfraPattern {
    /// Whether `type_tag` is one of the pattern's common types.
    #[must_use]
    pub fn carries(&self, type_tag: TypeTag) -> bool {
        self.common_types.contains(&type_tag)
    }

    /// Whether `input` is one of the pattern's related input names.
    #[must_use]
    pub fn relates_to(&self, input: &str) -> bool {
        self.related_inputs.contains(&input)
    }
}

/// Domain terms kept by keyword extraction regardless of length.
pub const DOMAIN_TERMS: &[&str] = &[
    "subnet",
    "vpc",
    "security",
    "group",
    "log",
    "volume",
    "dedicated",
    "private",
    "database",
    "id",
    "ids",
];

/// The built-in pattern table.
pub const PATTERNS: &[InfraPattern] = &[
    InfraPattern {
        name: "networking",
        keywords: &["vpc", "subnet", "subnets", "cidr", "network", "private", "public"],
        common_types: &[TypeTag::String, TypeTag::List],
        related_inputs: &[
            "vpc_id",
            "subnet_ids",
            "subnets",
            "private_subnets",
            "public_subnets",
            "vpc_cidr_block",
        ],
    },
    InfraPattern {
        name: "security",
        keywords: &["security", "group", "ingress", "egress", "firewall"],
        common_types: &[TypeTag::String, TypeTag::List],
        related_inputs: &[
            "security_group_id",
            "security_group_ids",
            "security_groups",
            "vpc_security_group_ids",
        ],
    },
    InfraPattern {
        name: "logging",
        keywords: &["log", "logs", "logging", "cloudwatch", "retention"],
        common_types: &[TypeTag::String],
        related_inputs: &[
            "log_group_name",
            "cloudwatch_log_group_name",
            "log_bucket",
            "log_destination_arn",
        ],
    },
    InfraPattern {
        name: "storage",
        keywords: &["volume", "volumes", "bucket", "storage", "ebs"],
        common_types: &[TypeTag::String, TypeTag::List],
        related_inputs: &["volume_id", "ebs_volume_ids", "bucket_name", "bucket_arn"],
    },
    InfraPattern {
        name: "database",
        keywords: &["database", "rds", "cluster", "replica"],
        common_types: &[TypeTag::String, TypeTag::List],
        related_inputs: &[
            "db_subnet_group_name",
            "database_subnet_group_name",
            "database_subnets",
            "db_instance_identifier",
        ],
    },
    InfraPattern {
        name: "compute",
        keywords: &["instance", "dedicated", "tenancy", "launch", "ami"],
        common_types: &[TypeTag::String, TypeTag::Bool],
        related_inputs: &["instance_tenancy", "instance_type", "ami_id", "dedicated_host_id"],
    },
    InfraPattern {
        name: "encryption",
        keywords: &["kms", "encryption", "encrypted", "key"],
        common_types: &[TypeTag::String, TypeTag::Bool],
        related_inputs: &["kms_key_id", "kms_key_arn", "encrypted"],
    },
];

/// Whether `term` is a keyword of any known pattern.
#[must_use]
pub fn is_pattern_term(term: &str) -> bool {
    PATTERNS.iter().any(|p| p.keywords.contains(&term))
}

/// Patterns that carry `type_tag`.
pub fn patterns_for(type_tag: TypeTag) -> impl Iterator<Item = &'static InfraPattern> {
    PATTERNS.iter().filter(move |p| p.carries(type_tag))
}
