use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "City Home Service API",
        version = "1.0.0",
        description = r#"
# City Home Service

Booking backend for home services: cleaning, repairs and maintenance.

## Authentication

Protected endpoints take a JWT in the Authorization header:

```
Authorization: Bearer <token>
```

Tokens come from `/auth/login` (customers) or `/auth/admin/login` (administrators).
Admin endpoints also require the administrator account to be active.

## Errors

Every error uses the same body:

```json
{ "message": "Coupon not found" }
```

## Money

Amounts are decimal numbers in rupees. Totals are always recomputed on the server.
        "#,
    ),
    tags(
        (name = "Auth", description = "Customer and administrator sign-in"),
        (name = "Catalog", description = "Bookable services"),
        (name = "Main services", description = "Landing-page category tiles"),
        (name = "Cart", description = "Cart pricing"),
        (name = "Checkout", description = "Placing bookings"),
        (name = "Orders", description = "Order management and booking history"),
        (name = "Users", description = "Administrator accounts"),
        (name = "Profiles", description = "Customer profiles"),
        (name = "Coupons", description = "Discount coupons"),
        (name = "Contact", description = "Contact form"),
        (name = "Uploads", description = "Image uploads"),
        (name = "Health", description = "Health check")
    ),
    paths(
        crate::handlers::health::health,

        crate::handlers::auth::signup,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh,
        crate::handlers::auth::admin_signup,
        crate::handlers::auth::admin_login,
        crate::handlers::auth::activate_admin,
        crate::handlers::auth::deactivate_admin,

        crate::handlers::offerings::list_services,
        crate::handlers::offerings::services_by_category,
        crate::handlers::offerings::list_offerings,
        crate::handlers::offerings::get_offering,
        crate::handlers::offerings::get_offering_by_code,
        crate::handlers::offerings::create_offering,
        crate::handlers::offerings::update_offering,
        crate::handlers::offerings::delete_offering,

        crate::handlers::main_services::list_active,
        crate::handlers::main_services::list_all,
        crate::handlers::main_services::get_tile,
        crate::handlers::main_services::create_tile,
        crate::handlers::main_services::update_tile,
        crate::handlers::main_services::delete_tile,

        crate::handlers::cart::quote,
        crate::handlers::checkout::checkout,

        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::my_bookings,

        crate::handlers::users::list_users,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,

        crate::handlers::profiles::list_profiles,
        crate::handlers::profiles::get_profile,
        crate::handlers::profiles::update_profile,
        crate::handlers::profiles::delete_profile,
        crate::handlers::profiles::get_me,
        crate::handlers::profiles::update_me,

        crate::handlers::coupons::lookup_code,
        crate::handlers::coupons::list_coupons,
        crate::handlers::coupons::get_coupon,
        crate::handlers::coupons::create_coupon,
        crate::handlers::coupons::update_coupon,
        crate::handlers::coupons::delete_coupon,

        crate::handlers::contact::submit,
        crate::handlers::contact::list_messages,

        crate::handlers::uploads::upload,
        crate::handlers::uploads::admin_upload,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::handlers::common::MessageResponse,
            crate::auth::Role,
            crate::cart::CartItem,
            crate::pricing::Quote,
            crate::services::checkout::CheckoutItem,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the `Bearer` scheme referenced by protected paths
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

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
