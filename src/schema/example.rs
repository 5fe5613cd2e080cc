/// A complete schema showing every supported key
pub const EXAMPLE_SCHEMA: &str = r#"{
  "tables": {
    "users": {
      "primary_key": "id",
      "columns": {
        "id": "id",
        "mongo_id": "string",
        "username": "string",
        "email": "string",
        "is_active": "boolean",
        "profile": "json",
        "created_at": "datetime"
      },
      "not_null": ["username"],
      "field_mapping": {
        "mongo_id": "_id",
        "username": "username",
        "email": "contact.email",
        "is_active": "active",
        "profile": "profile",
        "created_at": "createdAt"
      }
    },
    "user_pages": {
      "primary_key": "id",
      "columns": {
        "id": "id",
        "user_mongo_id": "string",
        "title": "string",
        "body": "text"
      },
      "field_mapping": {
        "title": "pages[].title",
        "body": "bio"
      },
      "parent_link": {
        "column": "user_mongo_id",
        "parent_field": "_id"
      }
    }
  }
}"#;
