//! GraphQL documents and variables for the Online Store theme API.
//!
//! The documents are sent verbatim to the Admin GraphQL endpoint. Page sizes
//! are fixed: 20 themes per list, 250 files per theme.

use serde::Serialize;

/// A GraphQL document together with its operation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document {
    pub query: &'static str,
    pub operation_name: &'static str,
}

/// Shop name, email, primary domain and plan. Used as a connection test.
pub const GET_SHOP: Document = Document {
    operation_name: "GetShop",
    query: r"
  query GetShop {
    shop {
      name
      email
      primaryDomain {
        url
        host
      }
      plan {
        displayName
      }
    }
  }
",
};

pub const LIST_THEMES: Document = Document {
    operation_name: "ListThemes",
    query: r"
  query ListThemes {
    themes(first: 20) {
      nodes {
        id
        name
        role
        processing
        createdAt
        updatedAt
      }
    }
  }
",
};

/// File metadata for one theme, no bodies.
pub const GET_THEME_FILES: Document = Document {
    operation_name: "GetThemeFiles",
    query: r"
  query GetThemeFiles($themeId: ID!) {
    theme(id: $themeId) {
      id
      name
      role
      files(first: 250) {
        nodes {
          filename
          size
          contentType
          checksumMd5
          createdAt
          updatedAt
        }
      }
    }
  }
",
};

/// One file body, text or base64 depending on the union member returned.
pub const GET_FILE_CONTENT: Document = Document {
    operation_name: "GetFileContent",
    query: r"
  query GetFileContent($themeId: ID!, $filenames: [String!]!) {
    theme(id: $themeId) {
      id
      name
      files(filenames: $filenames, first: 1) {
        nodes {
          filename
          size
          contentType
          body {
            ... on OnlineStoreThemeFileBodyText {
              content
            }
            ... on OnlineStoreThemeFileBodyBase64 {
              contentBase64
            }
          }
        }
      }
    }
  }
",
};

pub const UPSERT_THEME_FILE: Document = Document {
    operation_name: "ThemeFilesUpsert",
    query: r"
  mutation ThemeFilesUpsert($themeId: ID!, $files: [OnlineStoreThemeFilesUpsertFileInput!]!) {
    themeFilesUpsert(themeId: $themeId, files: $files) {
      upsertedThemeFiles {
        filename
        checksumMd5
      }
      userErrors {
        field
        message
      }
    }
  }
",
};

pub const DELETE_THEME_FILE: Document = Document {
    operation_name: "ThemeFilesDelete",
    query: r"
  mutation ThemeFilesDelete($themeId: ID!, $files: [String!]!) {
    themeFilesDelete(themeId: $themeId, files: $files) {
      deletedThemeFiles {
        filename
      }
      userErrors {
        field
        message
      }
    }
  }
",
};

const THEME_GID_PREFIX: &str = "gid://shopify/OnlineStoreTheme/";

/// Expand a bare numeric theme id into a GID. Anything else passes through.
///
/// ```
/// use api_tester_core::themes::theme_gid;
///
/// assert_eq!(theme_gid("123"), "gid://shopify/OnlineStoreTheme/123");
/// assert_eq!(
///     theme_gid("gid://shopify/OnlineStoreTheme/123"),
///     "gid://shopify/OnlineStoreTheme/123"
/// );
/// ```
#[must_use]
pub fn theme_gid(theme_id: &str) -> String {
    let theme_id = theme_id.trim();
    if !theme_id.is_empty() && theme_id.bytes().all(|b| b.is_ascii_digit()) {
        format!("{THEME_GID_PREFIX}{theme_id}")
    } else {
        theme_id.to_owned()
    }
}

// =============================================================================
// Variables
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeIdVariables {
    pub theme_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContentVariables {
    pub theme_id: String,
    pub filenames: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertFilesVariables {
    pub theme_id: String,
    pub files: Vec<ThemeFileInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeFileInput {
    pub filename: String,
    pub body: ThemeFileBody,
}

/// Upsert body. Always sent as `TEXT`.
#[derive(Debug, Clone, Serialize)]
pub struct ThemeFileBody {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
}

impl ThemeFileInput {
    #[must_use]
    pub fn text(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            body: ThemeFileBody {
                kind: "TEXT",
                value: content.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFilesVariables {
    pub theme_id: String,
    pub files: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_gid_expands_numeric() {
        assert_eq!(theme_gid("12345"), "gid://shopify/OnlineStoreTheme/12345");
        assert_eq!(theme_gid(" 7 "), "gid://shopify/OnlineStoreTheme/7");
    }

    #[test]
    fn test_theme_gid_passthrough() {
        let gid = "gid://shopify/OnlineStoreTheme/99";
        assert_eq!(theme_gid(gid), gid);
        assert_eq!(theme_gid(""), "");
    }

    #[test]
    fn test_upsert_variables_shape() {
        let vars = UpsertFilesVariables {
            theme_id: theme_gid("1"),
            files: vec![ThemeFileInput::text("snippets/a.liquid", "<p>hi</p>")],
        };
        let json = serde_json::to_value(vars).unwrap();
        assert_eq!(json["themeId"], "gid://shopify/OnlineStoreTheme/1");
        assert_eq!(json["files"][0]["filename"], "snippets/a.liquid");
        assert_eq!(json["files"][0]["body"]["type"], "TEXT");
        assert_eq!(json["files"][0]["body"]["value"], "<p>hi</p>");
    }

    #[test]
    fn test_documents_name_their_operation() {
        for doc in [
            GET_SHOP,
            LIST_THEMES,
            GET_THEME_FILES,
            GET_FILE_CONTENT,
            UPSERT_THEME_FILE,
            DELETE_THEME_FILE,
        ] {
            assert!(doc.query.contains(doc.operation_name));
        }
    }

    #[test]
    fn test_page_sizes() {
        assert!(LIST_THEMES.query.contains("themes(first: 20)"));
        assert!(GET_THEME_FILES.query.contains("files(first: 250)"));
    }
}
