//! Server-rendered pages for the sign-in flows.
//!
//! Plain HTML strings, no template engine. All interpolated values go through
//! [`escape_html`].

use crate::api::session::AuthContext;

/// One-time-code flow state, carried only through the rendered page.
#[derive(Debug)]
pub(super) enum OtpStep<'a> {
    AwaitingEmail {
        email: Option<&'a str>,
        error: Option<&'a str>,
    },
    AwaitingOtp {
        email: &'a str,
        notice: Option<&'a str>,
        error: Option<&'a str>,
    },
}

pub(super) fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for character in input.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(character),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 40rem; margin: 2rem auto; padding: 0 1rem; }}
.error {{ border: 1px solid #c00; background: #fee; padding: .5rem 1rem; margin-bottom: 1rem; }}
.notice {{ border: 1px solid #080; background: #efe; padding: .5rem 1rem; margin-bottom: 1rem; }}
label {{ display: block; margin-top: .75rem; }}
input {{ display: block; width: 100%; padding: .4rem; margin-top: .25rem; }}
button {{ margin-top: 1rem; padding: .5rem 1rem; }}
dt {{ font-weight: bold; margin-top: .5rem; }}
</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_html(title),
    )
}

fn error_banner(error: Option<&str>) -> String {
    error.map_or_else(String::new, |message| {
        format!(r#"<div class="error">{}</div>"#, escape_html(message))
    })
}

fn notice_banner(notice: Option<&str>) -> String {
    notice.map_or_else(String::new, |message| {
        format!(r#"<div class="notice">{}</div>"#, escape_html(message))
    })
}

pub(super) fn home_page(context: &AuthContext) -> String {
    let body = if let Some((user, session)) = context.as_pair() {
        format!(
            r#"<h1>Specimen</h1>
<div class="notice">Signed in as <strong>{email}</strong></div>
<h2>User</h2>
<dl>
<dt>ID</dt><dd>{user_id}</dd>
<dt>Name</dt><dd>{name}</dd>
<dt>Email verified</dt><dd>{verified}</dd>
</dl>
<h2>Session</h2>
<dl>
<dt>Session ID</dt><dd>{session_id}</dd>
<dt>Expires at</dt><dd>{expires_at}</dd>
</dl>
<form action="/ui/signout" method="post">
<button type="submit">Sign out</button>
</form>"#,
            email = escape_html(&user.email),
            user_id = escape_html(&user.id),
            name = escape_html(&user.name),
            verified = if user.email_verified { "Yes" } else { "No" },
            session_id = escape_html(&session.id),
            expires_at = escape_html(&session.expires_at),
        )
    } else {
        r#"<h1>Specimen</h1>
<div class="error">Not signed in.</div>
<p><a href="/ui/signin">Sign in</a> &middot; <a href="/ui/signup">Sign up</a> &middot; <a href="/ui/otp-signin">Sign in with a one-time code</a></p>"#
            .to_string()
    };
    layout("Specimen", &body)
}

pub(super) fn sign_in_page(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Sign in</h1>
{error}
<form action="/ui/signin" method="post">
<label for="email">Email</label>
<input type="email" id="email" name="email" required>
<label for="password">Password</label>
<input type="password" id="password" name="password" required>
<button type="submit">Sign in</button>
</form>
<p><a href="/ui/otp-signin">Sign in with a one-time code</a> &middot; <a href="/ui/signup">Sign up</a></p>"#,
        error = error_banner(error),
    );
    layout("Sign in", &body)
}

pub(super) fn sign_up_page(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Sign up</h1>
{error}
<form action="/ui/signup" method="post">
<label for="name">Name</label>
<input type="text" id="name" name="name" required>
<label for="email">Email</label>
<input type="email" id="email" name="email" required>
<label for="password">Password</label>
<input type="password" id="password" name="password" required>
<label for="confirm_password">Confirm password</label>
<input type="password" id="confirm_password" name="confirm_password" required>
<button type="submit">Sign up</button>
</form>
<p>Already have an account? <a href="/ui/signin">Sign in</a></p>"#,
        error = error_banner(error),
    );
    layout("Sign up", &body)
}

pub(super) fn otp_page(step: &OtpStep<'_>) -> String {
    let body = match step {
        OtpStep::AwaitingEmail { email, error } => format!(
            r#"<h1>Sign in with a one-time code</h1>
{error}
<form action="/ui/otp-signin" method="post">
<input type="hidden" name="action" value="send-otp">
<label for="email">Email</label>
<input type="email" id="email" name="email" required value="{email}">
<button type="submit">Send code</button>
</form>
<p>Prefer a password? <a href="/ui/signin">Sign in</a></p>"#,
            error = error_banner(*error),
            email = escape_html(email.unwrap_or_default()),
        ),
        OtpStep::AwaitingOtp {
            email,
            notice,
            error,
        } => format!(
            r#"<h1>Enter your one-time code</h1>
{error}{notice}
<p>A code was sent to <strong>{email}</strong>.</p>
<form action="/ui/otp-signin" method="post">
<input type="hidden" name="action" value="verify-otp">
<input type="hidden" name="email" value="{email}">
<label for="otp">One-time code</label>
<input type="text" id="otp" name="otp" required maxlength="6" pattern="[0-9]{{6}}" autocomplete="one-time-code">
<button type="submit">Sign in</button>
</form>
<p><a href="/ui/otp-signin">Use a different email</a></p>"#,
            error = error_banner(*error),
            notice = notice_banner(*notice),
            email = escape_html(email),
        ),
    };
    layout("Sign in with a one-time code", &body)
}
