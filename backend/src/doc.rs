//! OpenAPI documentation for the REST API.
//!
//! Served by Swagger UI in debug builds and exported by the `openapi-dump`
//! binary.

use utoipa::OpenApi;

use crate::domain::{CreateUserRequest, Error, ErrorCode, UpdateUserRequest, User};
use crate::inbound::http::users::{DeleteUserResponse, UserListResponse};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "User service API",
        description = "User CRUD with idempotent creation keyed by the Idempotency-Key header."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        User,
        CreateUserRequest,
        UpdateUserRequest,
        UserListResponse,
        DeleteUserResponse,
        Error,
        ErrorCode
    )),
    tags(
        (name = "users", description = "User management"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    fn every_user_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in ["/api/users", "/api/users/{id}", "/health/ready", "/health/live"] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[rstest]
    fn error_schema_uses_the_wire_field_names() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "error");
        assert_object_schema_has_field(error_schema, "code");
    }

    #[rstest]
    fn user_schema_lists_entity_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let user_schema = schemas.get("User").expect("User schema");

        for field in ["id", "name", "email", "role", "created_at", "updated_at"] {
            assert_object_schema_has_field(user_schema, field);
        }
    }
}
