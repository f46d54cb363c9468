//! Guest notification adapters
//!
//! [`SmtpNotifier`] sends HTML mail through lettre's async SMTP transport.
//! [`LogNotifier`] only logs and is used when email is disabled.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use stayhub_core::{
    config::EmailConfig,
    models::{Accommodation, Booking, Payment, UserProfile},
    traits::Notifier,
    AppError, AppResult,
};
use tracing::{debug, error, info, instrument};

/// A rendered email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub html: String,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, greeting: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #2563eb;">{title}</h2>
        <p>Hello {greeting},</p>
{body}
        <p style="color: #666; font-size: 12px; margin-top: 40px;">StayHub</p>
    </div>
</body>
</html>
"#
    )
}

fn stay_table(booking: &Booking, accommodation: &Accommodation) -> String {
    let room = accommodation
        .room(booking.room_index)
        .map(|r| escape(&r.name))
        .unwrap_or_else(|| format!("Room {}", booking.room_index));

    format!(
        r#"        <table style="border-collapse: collapse;">
            <tr><td>Accommodation</td><td>{name}</td></tr>
            <tr><td>Address</td><td>{address}, {city}</td></tr>
            <tr><td>Room</td><td>{room}</td></tr>
            <tr><td>Check-in</td><td>{check_in}</td></tr>
            <tr><td>Check-out</td><td>{check_out}</td></tr>
            <tr><td>Guests</td><td>{guests}</td></tr>
            <tr><td>Total</td><td>{total}</td></tr>
            <tr><td>Booking reference</td><td>{id}</td></tr>
        </table>"#,
        name = escape(&accommodation.name),
        address = escape(&accommodation.address),
        city = escape(&accommodation.city),
        check_in = booking.check_in,
        check_out = booking.check_out,
        guests = booking.guests,
        total = booking.total_price,
        id = booking.id,
    )
}

pub fn booking_created_email(
    booking: &Booking,
    accommodation: &Accommodation,
    user: &UserProfile,
) -> Email {
    let requests = booking
        .special_requests
        .as_deref()
        .map(|r| format!("\n        <p>Special requests: {}</p>", escape(r)))
        .unwrap_or_default();

    let body = format!(
        "        <p>Your booking has been received and is awaiting payment.</p>\n{}{}",
        stay_table(booking, accommodation),
        requests
    );

    Email {
        subject: format!("Booking Confirmation - {}", accommodation.name),
        html: layout("Booking Confirmation", &escape(&user.full_name()), &body),
    }
}

pub fn payment_receipt_email(
    payment: &Payment,
    booking: &Booking,
    accommodation: &Accommodation,
    user: &UserProfile,
) -> Email {
    let body = format!(
        "        <p>We received your payment of {} ({}), reference <strong>{}</strong>.</p>\n{}",
        payment.amount,
        payment.payment_method,
        escape(&payment.reference),
        stay_table(booking, accommodation)
    );

    Email {
        subject: format!("Payment Receipt - {}", accommodation.name),
        html: layout("Payment Receipt", &escape(&user.full_name()), &body),
    }
}

pub fn booking_reminder_email(
    booking: &Booking,
    accommodation: &Accommodation,
    user: &UserProfile,
) -> Email {
    let body = format!(
        "        <p>This is a reminder that your stay begins on {}.</p>\n{}",
        booking.check_in,
        stay_table(booking, accommodation)
    );

    Email {
        subject: format!("Reminder: Your Stay at {}", accommodation.name),
        html: layout("Upcoming Stay", &escape(&user.full_name()), &body),
    }
}

pub fn booking_auto_cancelled_email(
    booking: &Booking,
    accommodation: &Accommodation,
    user: &UserProfile,
) -> Email {
    let body = format!(
        "        <p>Your payment was received, but the room had already been confirmed for another \
         guest on overlapping dates. Your booking has been cancelled and a refund will follow.</p>\n{}",
        stay_table(booking, accommodation)
    );

    Email {
        subject: format!("Booking Cancelled - {}", accommodation.name),
        html: layout("Booking Cancelled", &escape(&user.full_name()), &body),
    }
}

/// SMTP notifier
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build a STARTTLS transport from configuration
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the relay or sender address is invalid.
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid from address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .map_err(|e| AppError::Config(format!("SMTP relay error: {}", e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        info!(
            "SMTP notifier configured for {}:{}",
            config.smtp_server, config.smtp_port
        );

        Ok(Self { transport, from })
    }

    #[instrument(skip(self, email), fields(subject = %email.subject))]
    async fn send(&self, to: &str, email: Email) -> AppResult<()> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| AppError::Notification(format!("Invalid recipient {}: {}", to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)
            .map_err(|e| AppError::Notification(format!("Failed to build email: {}", e)))?;

        self.transport.send(message).await.map_err(|e| {
            error!("SMTP send failed: {}", e);
            AppError::Notification(format!("Failed to send email: {}", e))
        })?;

        debug!("Email sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify_booking_created(
        &self,
        booking: &Booking,
        accommodation: &Accommodation,
        user: &UserProfile,
    ) -> AppResult<()> {
        self.send(&user.email, booking_created_email(booking, accommodation, user))
            .await
    }

    async fn notify_payment_receipt(
        &self,
        payment: &Payment,
        booking: &Booking,
        accommodation: &Accommodation,
        user: &UserProfile,
    ) -> AppResult<()> {
        self.send(
            &user.email,
            payment_receipt_email(payment, booking, accommodation, user),
        )
        .await
    }

    async fn notify_booking_auto_cancelled(
        &self,
        booking: &Booking,
        accommodation: &Accommodation,
        user: &UserProfile,
    ) -> AppResult<()> {
        self.send(
            &user.email,
            booking_auto_cancelled_email(booking, accommodation, user),
        )
        .await
    }

    async fn notify_booking_reminder(
        &self,
        booking: &Booking,
        accommodation: &Accommodation,
        user: &UserProfile,
    ) -> AppResult<()> {
        self.send(&user.email, booking_reminder_email(booking, accommodation, user))
            .await
    }
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_booking_created(
        &self,
        booking: &Booking,
        accommodation: &Accommodation,
        user: &UserProfile,
    ) -> AppResult<()> {
        let email = booking_created_email(booking, accommodation, user);
        info!(to = %user.email, booking_id = %booking.id, "{}", email.subject);
        Ok(())
    }

    async fn notify_payment_receipt(
        &self,
        payment: &Payment,
        booking: &Booking,
        accommodation: &Accommodation,
        user: &UserProfile,
    ) -> AppResult<()> {
        let email = payment_receipt_email(payment, booking, accommodation, user);
        info!(to = %user.email, reference = %payment.reference, "{}", email.subject);
        Ok(())
    }

    async fn notify_booking_auto_cancelled(
        &self,
        booking: &Booking,
        accommodation: &Accommodation,
        user: &UserProfile,
    ) -> AppResult<()> {
        let email = booking_auto_cancelled_email(booking, accommodation, user);
        info!(to = %user.email, booking_id = %booking.id, "{}", email.subject);
        Ok(())
    }

    async fn notify_booking_reminder(
        &self,
        booking: &Booking,
        accommodation: &Accommodation,
        user: &UserProfile,
    ) -> AppResult<()> {
        let email = booking_reminder_email(booking, accommodation, user);
        info!(to = %user.email, booking_id = %booking.id, "{}", email.subject);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{accommodation, date, user};
    use rust_decimal_macros::dec;
    use stayhub_core::models::{PaymentAuthorization, PaymentMethod, StayDates};
    use uuid::Uuid;

    fn booking(acc: &Accommodation) -> Booking {
        Booking::new(
            acc.id,
            1,
            Uuid::new_v4(),
            StayDates::new(date(10), date(12)).unwrap(),
            2,
            dec!(500),
            Some("<b>late</b> arrival".to_string()),
        )
    }

    #[test]
    fn test_subjects() {
        let acc = accommodation("Lagoon View", None);
        let guest = user(false);
        let b = booking(&acc);
        let payment = Payment::pending(
            b.id,
            guest.id,
            dec!(500),
            PaymentMethod::Card,
            &PaymentAuthorization {
                reference: "ACCOM-0000000001".to_string(),
                authorization_url: "https://checkout.example".to_string(),
                access_code: None,
            },
        );

        assert_eq!(
            booking_created_email(&b, &acc, &guest).subject,
            "Booking Confirmation - Lagoon View"
        );
        assert_eq!(
            payment_receipt_email(&payment, &b, &acc, &guest).subject,
            "Payment Receipt - Lagoon View"
        );
        assert_eq!(
            booking_reminder_email(&b, &acc, &guest).subject,
            "Reminder: Your Stay at Lagoon View"
        );
        assert_eq!(
            booking_auto_cancelled_email(&b, &acc, &guest).subject,
            "Booking Cancelled - Lagoon View"
        );
    }

    #[test]
    fn test_body_has_stay_details_and_escapes_input() {
        let acc = accommodation("Tom & Jerry's", None);
        let guest = user(false);
        let b = booking(&acc);

        let html = booking_created_email(&b, &acc, &guest).html;
        assert!(html.contains("Tom &amp; Jerry&#39;s"));
        assert!(html.contains("2024-01-10"));
        assert!(html.contains("2024-01-12"));
        assert!(html.contains("Room at 250"));
        assert!(html.contains("&lt;b&gt;late&lt;/b&gt; arrival"));
        assert!(html.contains("Hello Ada Obi,"));
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let acc = accommodation("Lagoon View", None);
        let guest = user(false);
        let b = booking(&acc);
        assert!(LogNotifier
            .notify_booking_reminder(&b, &acc, &guest)
            .await
            .is_ok());
    }

    #[test]
    fn test_smtp_notifier_rejects_bad_sender() {
        let config = EmailConfig {
            from_email: "not an address".to_string(),
            ..EmailConfig::default()
        };
        assert!(matches!(
            SmtpNotifier::new(&config),
            Err(AppError::Config(_))
        ));
    }
}
