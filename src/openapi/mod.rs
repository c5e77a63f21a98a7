use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Registers the `Bearer` scheme referenced by authenticated routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Phone Inventory API",
        version = "1.0.0",
        description = r#"
# Phone Inventory API

Tracks phones from supply to sale: registration of new stock and status-scoped listings.

## Authentication

Registering phones requires a JWT issued for an admin or super admin:

```
Authorization: Bearer <your-jwt-token>
```

## Pagination

Listing endpoints accept:
- `page`: Page number (default: 1)
- `limit`: Items per page (default: 10)

Both must be positive integers when given.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Phones", description = "Phone registration and listings"),
    ),
    modifiers(&SecurityAddon),
    paths(
        crate::handlers::phones::register_phone,
        crate::handlers::phones::list_active_phones,
        crate::handlers::phones::list_suspended_phones,
        crate::handlers::phones::list_sold_phones,
        crate::handlers::phones::list_lost_phones,
    ),
    components(
        schemas(
            crate::handlers::phones::RegisterPhoneRequest,
            crate::handlers::phones::PhoneResponse,
            crate::handlers::phones::PhoneListResponse,
            crate::services::PhoneListItem,
            crate::entities::phone::PhoneStatus,
            crate::entities::user::Role,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
