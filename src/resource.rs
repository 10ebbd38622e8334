//! Resource registry
//!
//! One static metadata record per resource drives the generic CRUD
//! implementation: which fields a create must carry, which fields get
//! stamped with defaults, and whether list honors a soft-delete flag.

use serde_json::{Map, Value};

/// Metadata for one resource collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Collection name as it appears in the path
    pub name: &'static str,
    /// Fields that must be present and non-empty on create
    pub required: &'static [&'static str],
    /// Fields stamped at create time when the payload omits them
    pub defaults: &'static [&'static str],
    /// Whether list filters items carrying `is_deleted = true`
    ///
    /// Only forms sets this. The flag is intentionally per-resource
    /// configuration, not universal behavior.
    pub soft_delete: bool,
}

/// The configured resource set, in path-name order
pub const RESOURCES: &[ResourceSpec] = &[
    ResourceSpec {
        name: "forms",
        required: &["name", "email"],
        defaults: &["phone", "message", "case_type"],
        soft_delete: true,
    },
    ResourceSpec {
        name: "cases",
        required: &["case_number", "title"],
        defaults: &["description", "court", "judgment_date"],
        soft_delete: false,
    },
    ResourceSpec {
        name: "messages",
        required: &["sender", "recipient", "body"],
        defaults: &[],
        soft_delete: false,
    },
    ResourceSpec {
        name: "appointments",
        required: &["client", "datetime"],
        defaults: &["mode", "status", "notes"],
        soft_delete: false,
    },
    ResourceSpec {
        name: "services",
        required: &["name"],
        defaults: &["category", "shown"],
        soft_delete: false,
    },
    ResourceSpec {
        name: "files",
        required: &["title", "type", "file_url"],
        defaults: &["description", "category", "status", "tags"],
        soft_delete: false,
    },
];

/// Look up a resource by its path name
pub fn lookup(name: &str) -> Option<&'static ResourceSpec> {
    RESOURCES.iter().find(|spec| spec.name == name)
}

/// Comma-joined resource names for diagnostics
pub fn allowed_names() -> String {
    RESOURCES
        .iter()
        .map(|spec| spec.name)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ResourceSpec {
    /// Check that every required field is present and usable
    ///
    /// A field counts as missing when it is absent, null, or an empty string.
    pub fn has_required(&self, payload: &Map<String, Value>) -> bool {
        self.required.iter().all(|field| {
            match payload.get(*field) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            }
        })
    }

    /// The 400 message listing this resource's required fields
    ///
    /// Two fields join with " and ", any other count with ", ":
    /// "name and email required for forms",
    /// "sender, recipient, body required for messages".
    pub fn required_message(&self) -> String {
        let fields = if self.required.len() == 2 {
            self.required.join(" and ")
        } else {
            self.required.join(", ")
        };
        format!("{fields} required for {name}", name = self.name)
    }
}
