//! The closed set of generated verbs and everything fixed per verb.

use crate::config::{OptionalFields, SchemaConfig};
use crate::error::ConfigError;
use axum::http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generated verb. `GetList` is a pseudo-verb sent as GET on the wire so that
/// list and single-item handlers can both exist under GET.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    GetList,
    Post,
    Put,
    Patch,
    Delete,
}

/// Whether a route addresses the collection or one item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UrlFragment {
    Collection,
    Item,
}

impl UrlFragment {
    /// Fragment as documented (OpenAPI style).
    pub fn as_str(self) -> &'static str {
        match self {
            UrlFragment::Collection => "/",
            UrlFragment::Item => "/{id}",
        }
    }

    /// Fragment in axum's route syntax.
    pub fn route_path(self) -> &'static str {
        match self {
            UrlFragment::Collection => "/",
            UrlFragment::Item => "/:id",
        }
    }
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Get,
        Verb::GetList,
        Verb::Post,
        Verb::Patch,
        Verb::Put,
        Verb::Delete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::GetList => "GETLIST",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }

    /// Method sent on the wire.
    pub fn wire_method(self) -> Method {
        match self {
            Verb::Get | Verb::GetList => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        }
    }

    /// Title-cased wire verb used in generated schema names (`GETLIST` -> `Get`).
    pub fn title(self) -> &'static str {
        match self {
            Verb::Get | Verb::GetList => "Get",
            Verb::Post => "Post",
            Verb::Put => "Put",
            Verb::Patch => "Patch",
            Verb::Delete => "Delete",
        }
    }

    pub fn url_fragment(self) -> UrlFragment {
        match self {
            Verb::GetList | Verb::Post => UrlFragment::Collection,
            Verb::Get | Verb::Put | Verb::Patch | Verb::Delete => UrlFragment::Item,
        }
    }

    /// Suffix of the generated handler name, prefixed by the model name.
    pub fn handler_suffix(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::GetList => "get_list",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Patch => "patch",
            Verb::Delete => "delete",
        }
    }

    pub fn accepts_payload(self) -> bool {
        matches!(self, Verb::Post | Verb::Put | Verb::Patch)
    }

    pub fn has_response_schema(self) -> bool {
        !matches!(self, Verb::Delete)
    }

    /// Defaults merged under user overrides for the request schema.
    pub fn default_request_schema_config(self) -> SchemaConfig {
        match self {
            Verb::Post | Verb::Put => SchemaConfig {
                name: Some("Generated{model}In".into()),
                exclude: Some(vec!["id".into()]),
                ..Default::default()
            },
            Verb::Patch => SchemaConfig {
                exclude: Some(vec!["id".into()]),
                optional_fields: Some(OptionalFields::All),
                ..Default::default()
            },
            Verb::Get | Verb::GetList | Verb::Delete => SchemaConfig::default(),
        }
    }

    /// Defaults merged under user overrides for the response schema.
    pub fn default_response_schema_config(self) -> SchemaConfig {
        match self {
            Verb::Delete => SchemaConfig::default(),
            Verb::Get | Verb::GetList | Verb::Post | Verb::Put | Verb::Patch => SchemaConfig {
                name: Some("Generated{model}Out".into()),
                ..Default::default()
            },
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Verb {
    type Err = ConfigError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "GETLIST" => Ok(Verb::GetList),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            "DELETE" => Ok(Verb::Delete),
            _ => Err(ConfigError::UnsupportedVerb(s.to_string())),
        }
    }
}
