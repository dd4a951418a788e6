use crate::domain::{NewSubscriber, SubscriberEmail, SubscriberName};
use crate::routes::layout::{escape, flash_messages_html, page};
use crate::services::{NewsletterService, OptOutError, SignUpError};
use crate::utils::error_chain_fmt;
use actix_web::http::header::{ContentType, LOCATION};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use anyhow::Context;
use std::fmt::Write;

const SUBSCRIBE_PATH: &str = "/Newsletter/Subscribe";
const UNSUBSCRIBE_PATH: &str = "/Newsletter/Unsubscribe";

#[derive(serde::Deserialize)]
pub struct SubscribeFormData {
    pub name: String,
    pub email: String,
}

impl TryFrom<SubscribeFormData> for NewSubscriber {
    type Error = String;

    fn try_from(value: SubscribeFormData) -> Result<Self, Self::Error> {
        let name = SubscriberName::parse(value.name)?;
        let email = SubscriberEmail::parse(value.email)?;

        Ok(NewSubscriber { email, name })
    }
}

#[derive(serde::Deserialize)]
pub struct UnsubscribeFormData {
    pub email: String,
}

#[derive(thiserror::Error)]
pub enum NewsletterError {
    #[error("{message}")]
    ValidationError { message: String, form: Form },
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

/// Which form to re-render when validation fails.
#[derive(Debug, Clone, Copy)]
pub enum Form {
    Subscribe,
    Unsubscribe,
}

impl std::fmt::Debug for NewsletterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for NewsletterError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError { .. } => StatusCode::BAD_REQUEST,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::ValidationError { message, form } => {
                let errors = format!(r#"<p class="flash error"><i>{}</i></p>"#, escape(message));
                let body = match form {
                    Form::Subscribe => subscribe_page(&errors),
                    Form::Unsubscribe => unsubscribe_page(&errors),
                };
                HttpResponse::build(self.status_code())
                    .content_type(ContentType::html())
                    .body(body)
            }
            Self::UnexpectedError(_) => HttpResponse::build(self.status_code())
                .content_type(ContentType::plaintext())
                .body(format!("{:?}", self)),
        }
    }
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

fn subscribe_page(messages_html: &str) -> String {
    page(
        "Subscribe",
        &format!(
            r#"<h1>Subscribe to our newsletter</h1>
{messages_html}
<form action="{SUBSCRIBE_PATH}" method="post">
    <label>Name
        <input type="text" placeholder="Enter your name" name="name" required>
    </label>
    <br>
    <label>Email
        <input type="email" placeholder="Enter your email" name="email" required>
    </label>
    <br>
    <button type="submit">Subscribe</button>
</form>"#
        ),
    )
}

fn unsubscribe_page(messages_html: &str) -> String {
    page(
        "Unsubscribe",
        &format!(
            r#"<h1>Unsubscribe from our newsletter</h1>
{messages_html}
<form action="{UNSUBSCRIBE_PATH}" method="post">
    <label>Email
        <input type="email" placeholder="Enter your email" name="email" required>
    </label>
    <br>
    <button type="submit">Unsubscribe</button>
</form>"#
        ),
    )
}

pub async fn subscribe_form(flash_messages: IncomingFlashMessages) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(subscribe_page(&flash_messages_html(&flash_messages)))
}

#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(form, service),
    fields(
        subscriber_email = %form.email,
        subscriber_name = %form.name)
)]
pub async fn subscribe(
    form: web::Form<SubscribeFormData>,
    service: web::Data<NewsletterService>,
) -> Result<HttpResponse, NewsletterError> {
    let new_subscriber: NewSubscriber =
        form.0
            .try_into()
            .map_err(|message| NewsletterError::ValidationError {
                message,
                form: Form::Subscribe,
            })?;

    match service.sign_up(new_subscriber).await {
        Ok(subscriber) => {
            FlashMessage::success(NewsletterService::welcome_message(&subscriber)).send()
        }
        Err(e @ SignUpError::AlreadySubscribed) => FlashMessage::error(e.to_string()).send(),
        Err(SignUpError::UnexpectedError(e)) => {
            return Err(e.context("Failed to sign up a new subscriber.").into())
        }
    }

    Ok(see_other(SUBSCRIBE_PATH))
}

pub async fn unsubscribe_form(flash_messages: IncomingFlashMessages) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(unsubscribe_page(&flash_messages_html(&flash_messages)))
}

#[tracing::instrument(
    name = "Removing a subscriber",
    skip(form, service),
    fields(subscriber_email = %form.email)
)]
pub async fn unsubscribe(
    form: web::Form<UnsubscribeFormData>,
    service: web::Data<NewsletterService>,
) -> Result<HttpResponse, NewsletterError> {
    let email = SubscriberEmail::parse(form.0.email).map_err(|message| {
        NewsletterError::ValidationError {
            message,
            form: Form::Unsubscribe,
        }
    })?;

    match service.opt_out(&email).await {
        Ok(()) => FlashMessage::success(NewsletterService::farewell_message()).send(),
        Err(e @ OptOutError::NotSubscribed) => FlashMessage::error(e.to_string()).send(),
        Err(OptOutError::UnexpectedError(e)) => {
            return Err(e.context("Failed to opt a subscriber out.").into())
        }
    }

    Ok(see_other(UNSUBSCRIBE_PATH))
}

#[tracing::instrument(name = "Listing subscribers", skip(service))]
pub async fn subscribers(
    service: web::Data<NewsletterService>,
) -> Result<HttpResponse, NewsletterError> {
    let subscribers = service
        .active_subscribers()
        .await
        .context("Failed to load the subscriber list.")?;

    let mut rows = String::new();
    for s in &subscribers {
        let _ = writeln!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(s.name.as_ref()),
            escape(s.email.as_ref()),
            s.subscribed_at.format("%Y-%m-%d %H:%M UTC")
        );
    }

    let table = if subscribers.is_empty() {
        "<p>No subscribers yet.</p>".to_string()
    } else {
        format!(
            r#"<table>
<thead><tr><th>Name</th><th>Email</th><th>Subscribed</th></tr></thead>
<tbody>
{rows}</tbody>
</table>"#
        )
    };

    Ok(HttpResponse::Ok().content_type(ContentType::html()).body(page(
        "Subscribers",
        &format!(
            "<h1>Subscribers</h1>\n<p>{} active subscriber(s).</p>\n{}",
            subscribers.len(),
            table
        ),
    )))
}
