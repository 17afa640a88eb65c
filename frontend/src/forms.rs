//! Form validation, simulated submits and field collection.

use gloo_timers::callback::Timeout;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, HtmlFormElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};

use crate::dom::{listen, query_in, set_style, SharedContext};
use crate::notify::ToastKind;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

const INVALID_BORDER: &str = "#f44336";
const VALID_BORDER: &str = "#e1e5e9";
const MANAGED_ATTR: &str = "data-managed";

const NEWSLETTER_DELAY_MS: u32 = 2_000;
const GENERIC_BUSY_MS: u32 = 3_000;

/// User-facing validation failures; `Display` is the notification text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please fill in all required fields")]
    MissingRequired,
    #[error("Please enter your password")]
    MissingPassword,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn validate_contact(name: &str, email: &str, message: &str) -> Result<(), FormError> {
    if [name, email, message].iter().any(|v| v.trim().is_empty()) {
        return Err(FormError::MissingFields);
    }
    if !is_valid_email(email) {
        return Err(FormError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_newsletter(email: &str) -> Result<(), FormError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(FormError::InvalidEmail)
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<(), FormError> {
    validate_newsletter(email)?;
    if password.is_empty() {
        return Err(FormError::MissingPassword);
    }
    Ok(())
}

pub fn validate_signup(name: &str, email: &str, password: &str) -> Result<(), FormError> {
    if [name, email, password].iter().any(|v| v.trim().is_empty()) {
        return Err(FormError::MissingFields);
    }
    validate_newsletter(email)
}

/// Turns named form fields into a JSON body: numeric text becomes a JSON
/// number, blank fields are left out so the backend applies its defaults.
pub fn form_payload(fields: Vec<(String, String)>) -> Map<String, Value> {
    let mut payload = Map::new();
    for (name, raw) in fields {
        let value = raw.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        let json = if let Ok(int) = value.parse::<i64>() {
            Value::Number(int.into())
        } else if let Some(num) = value.parse::<f64>().ok().and_then(Number::from_f64) {
            Value::Number(num)
        } else {
            Value::String(value.to_string())
        };
        payload.insert(name, json);
    }
    payload
}

/// Current value of the named control inside `form`, empty when absent.
pub fn field_value(form: &Element, name: &str) -> String {
    query_in(form, &format!("[name=\"{}\"]", name))
        .map(|el| control_value(&el))
        .unwrap_or_default()
}

fn control_value(el: &Element) -> String {
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
        select.value()
    } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
        area.value()
    } else {
        String::new()
    }
}

/// `(name, value)` of every named, submittable control in document order.
pub fn collect_fields(form: &Element) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    let Ok(list) = form.query_selector_all("input[name], select[name], textarea[name]") else {
        return fields;
    };
    for i in 0..list.length() {
        let Some(el) = list.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            let kind = input.type_();
            if matches!(kind.as_str(), "submit" | "button" | "reset") {
                continue;
            }
            if matches!(kind.as_str(), "checkbox" | "radio") && !input.checked() {
                continue;
            }
        }
        let name = el.get_attribute("name").unwrap_or_default();
        fields.push((name, control_value(&el)));
    }
    fields
}

/// Marks a form as owned by a dedicated handler so the generic
/// required-field pass leaves it alone.
pub fn claim(form: &Element) {
    let _ = form.set_attribute(MANAGED_ATTR, "true");
}

pub fn reset(form: &Element) {
    if let Some(form) = form.dyn_ref::<HtmlFormElement>() {
        form.reset();
    }
}

/// Colours every required control and reports whether all are filled.
pub fn validate_required(form: &Element) -> bool {
    let mut valid = true;
    if let Ok(list) = form.query_selector_all("input[required], textarea[required]") {
        for i in 0..list.length() {
            let Some(el) = list.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            if control_value(&el).trim().is_empty() {
                set_style(&el, "border-color", INVALID_BORDER);
                valid = false;
            } else {
                set_style(&el, "border-color", VALID_BORDER);
            }
        }
    }
    valid
}

/// Puts the form's submit button into a disabled "working" state and returns
/// what is needed to undo it.
pub fn set_busy(form: &Element, label: &str) -> Option<(Element, String)> {
    let button = query_in(form, "button[type=\"submit\"]")?;
    if button.has_attribute("disabled") {
        return None;
    }
    let original = button.inner_html();
    button.set_inner_html(&format!("<i class=\"fas fa-spinner fa-spin\"></i> {}", label));
    let _ = button.set_attribute("disabled", "");
    Some((button, original))
}

pub fn restore_busy(button: &Element, original: &str) {
    button.set_inner_html(original);
    let _ = button.remove_attribute("disabled");
}

pub fn attach(ctx: &SharedContext) {
    attach_contact(ctx);
    attach_newsletter(ctx);
}

/// Must run after every dedicated form handler has claimed its form.
pub fn attach_generic(ctx: &SharedContext) {
    for form in ctx.query_all("form") {
        if form.has_attribute(MANAGED_ATTR) {
            continue;
        }
        let ctx = ctx.clone();
        let target = form.clone();
        listen(&form, "submit", move |event: Event| {
            if !validate_required(&target) {
                event.prevent_default();
                ctx.notifier.show(FormError::MissingRequired.to_string(), ToastKind::Error);
                return;
            }
            if let Some((button, original)) = set_busy(&target, "Processing...") {
                Timeout::new(GENERIC_BUSY_MS, move || restore_busy(&button, &original)).forget();
            }
        });
    }
}

fn attach_contact(ctx: &SharedContext) {
    let Some(form) = ctx.query(".contact-form") else {
        return;
    };
    claim(&form);

    let ctx = ctx.clone();
    let target = form.clone();
    listen(&form, "submit", move |event: Event| {
        event.prevent_default();
        let name = field_value(&target, "name");
        let email = field_value(&target, "email");
        let message = field_value(&target, "message");

        match validate_contact(&name, &email, &message) {
            Ok(()) => {
                ctx.notifier.show("Message sent successfully!", ToastKind::Success);
                reset(&target);
            }
            Err(err) => ctx.notifier.show(err.to_string(), ToastKind::Error),
        }
    });
}

fn attach_newsletter(ctx: &SharedContext) {
    let Some(form) = ctx.by_id("newsletterForm") else {
        return;
    };
    claim(&form);

    let ctx = ctx.clone();
    let target = form.clone();
    listen(&form, "submit", move |event: Event| {
        event.prevent_default();
        let email = ctx
            .by_id("newsletterEmail")
            .map(|el| control_value(&el))
            .unwrap_or_default();

        if let Err(err) = validate_newsletter(&email) {
            ctx.notifier.show(err.to_string(), ToastKind::Error);
            return;
        }

        let busy = set_busy(&target, "Subscribing...");
        let ctx = ctx.clone();
        let form = target.clone();
        Timeout::new(NEWSLETTER_DELAY_MS, move || {
            ctx.notifier.show(
                "Thank you for subscribing! You'll receive our weekly financial tips.",
                ToastKind::Success,
            );
            reset(&form);
            if let Some((button, original)) = busy {
                restore_busy(&button, &original);
            }
        })
        .forget();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_pattern() {
        for ok in ["a@b.co", "first.last@mail.example.in", "x+tag@y.z"] {
            assert!(is_valid_email(ok), "{ok}");
        }
        for bad in ["", "plain", "a@b", "@b.com", "a@.com ", "a b@c.com", "a@b@c.com", "a@b."] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[test]
    fn surrounding_whitespace_makes_an_email_invalid() {
        for padded in [" a@b.co", "a@b.co ", "\ta@b.co"] {
            assert_eq!(validate_newsletter(padded), Err(FormError::InvalidEmail), "{padded:?}");
            assert_eq!(validate_login(padded, "pw"), Err(FormError::InvalidEmail));
            assert_eq!(validate_signup("Ravi", padded, "pw"), Err(FormError::InvalidEmail));
        }
        assert_eq!(validate_contact("Asha", "a@b.co ", "hi"), Err(FormError::InvalidEmail));
    }

    #[test]
    fn contact_requires_every_field_before_email_check() {
        assert_eq!(validate_contact("", "bad", "hi"), Err(FormError::MissingFields));
        assert_eq!(validate_contact("Asha", "bad", "hi"), Err(FormError::InvalidEmail));
        assert_eq!(validate_contact("Asha", "asha@mail.com", "hi"), Ok(()));
    }

    #[test]
    fn notification_texts() {
        assert_eq!(FormError::MissingFields.to_string(), "Please fill in all fields");
        assert_eq!(FormError::InvalidEmail.to_string(), "Please enter a valid email address");
        assert_eq!(
            FormError::MissingRequired.to_string(),
            "Please fill in all required fields"
        );
    }

    #[test]
    fn login_and_signup_validation() {
        assert_eq!(validate_login("nope", "pw"), Err(FormError::InvalidEmail));
        assert_eq!(validate_login("a@b.co", ""), Err(FormError::MissingPassword));
        assert_eq!(validate_login("a@b.co", "pw"), Ok(()));

        assert_eq!(validate_signup("", "a@b.co", "pw"), Err(FormError::MissingFields));
        assert_eq!(validate_signup("Ravi", "a@b", "pw"), Err(FormError::InvalidEmail));
        assert_eq!(validate_signup("Ravi", "a@b.co", "pw"), Ok(()));
    }

    #[test]
    fn payload_types_numbers_and_skips_blanks() {
        let payload = form_payload(vec![
            ("monthly_income".into(), "50000".into()),
            ("interest_rate".into(), " 8.5 ".into()),
            ("goal".into(), "Save More".into()),
            ("emi".into(), "".into()),
            ("".into(), "orphan".into()),
        ]);

        assert_eq!(
            Value::Object(payload),
            json!({"monthly_income": 50000, "interest_rate": 8.5, "goal": "Save More"})
        );
    }

    #[test]
    fn payload_keeps_field_order() {
        let payload = form_payload(vec![
            ("b".into(), "1".into()),
            ("a".into(), "2".into()),
        ]);
        let keys: Vec<&String> = payload.keys().collect();
        assert_eq!(keys, ["b", "a"]);
    }
}
