use crate::domain::{ImageId, ImageStore};
use crate::routes::layout::{escape, html_response};
use actix_web::{web, HttpResponse};
use tracing_actix_web::RequestId;

/// Image shown on the landing page, resolved through the active image store.
pub struct HeroImage(pub Option<ImageId>);

pub async fn index(
    image_store: web::Data<dyn ImageStore>,
    hero_image: web::Data<HeroImage>,
) -> HttpResponse {
    let hero = match &hero_image.0 {
        Some(id) => format!(
            r#"<img class="hero" src="{}" alt="Newsletter hero image">"#,
            escape(&image_store.image_url(id))
        ),
        None => String::new(),
    };

    html_response(
        "Home",
        &format!(
            r#"{hero}
<h1>Welcome to our newsletter</h1>
<p>News, articles and updates straight to your inbox.</p>
<p><a href="/Newsletter/Subscribe">Subscribe now</a></p>"#
        ),
    )
}

pub async fn privacy() -> HttpResponse {
    html_response(
        "Privacy Policy",
        r#"<h1>Privacy Policy</h1>
<p>We store your name and email address for the sole purpose of sending you our newsletter.
You can remove them at any time from the <a href="/Newsletter/Unsubscribe">unsubscribe page</a>.</p>"#,
    )
}

pub async fn error(request_id: RequestId) -> HttpResponse {
    html_response(
        "Error",
        &format!(
            r#"<h1 class="text-danger">Error.</h1>
<h2 class="text-danger">An error occurred while processing your request.</h2>
<p><strong>Request ID:</strong> <code>{}</code></p>"#,
            request_id
        ),
    )
}
