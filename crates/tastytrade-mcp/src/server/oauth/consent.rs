//! HTML consent page for OAuth authorization.

use super::server::ConsentPrompt;

/// Render the authorization consent page.
///
/// All interpolated values are HTML-escaped to prevent XSS. The flow
/// parameters round-trip as hidden fields and are re-validated on
/// submission.
#[must_use]
pub fn render_consent_page(prompt: &ConsentPrompt) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Tastytrade MCP - Authorization</title>
<style>
* {{ margin: 0; padding: 0; box-sizing: border-box; }}
body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; background: #0f172a; color: #e2e8f0; min-height: 100vh; display: flex; align-items: center; justify-content: center; }}
.card {{ background: #1e293b; border-radius: 12px; padding: 2rem; max-width: 420px; width: 100%; box-shadow: 0 4px 24px rgba(0,0,0,0.3); }}
h1 {{ font-size: 1.3rem; margin-bottom: 0.5rem; color: #f8fafc; }}
.subtitle {{ color: #94a3b8; margin-bottom: 1.5rem; font-size: 0.9rem; }}
.client-info {{ background: #0f172a; border-radius: 8px; padding: 0.75rem 1rem; margin-bottom: 1.5rem; font-size: 0.85rem; color: #94a3b8; }}
.client-info strong {{ color: #e2e8f0; }}
label {{ display: block; margin-bottom: 0.4rem; font-size: 0.9rem; color: #cbd5e1; }}
input[type="password"] {{ width: 100%; padding: 0.65rem 0.75rem; border: 1px solid #334155; border-radius: 8px; background: #0f172a; color: #f8fafc; font-size: 0.95rem; margin-bottom: 1rem; }}
input[type="password"]:focus {{ outline: none; border-color: #3b82f6; }}
.buttons {{ display: flex; gap: 0.75rem; }}
button {{ flex: 1; padding: 0.65rem; border: none; border-radius: 8px; font-size: 0.95rem; cursor: pointer; font-weight: 500; }}
.btn-approve {{ background: #3b82f6; color: #fff; }}
.btn-approve:hover {{ background: #2563eb; }}
.btn-deny {{ background: #334155; color: #e2e8f0; }}
.btn-deny:hover {{ background: #475569; }}
</style>
</head>
<body>
<div class="card">
<h1>Authorize MCP Access</h1>
<p class="subtitle">An application is requesting access to your Tastytrade MCP server.</p>
<div class="client-info">
<strong>{client_name}</strong> wants to access your MCP tools.
<br>Scope: <strong>{scope}</strong>
</div>
<form method="POST" action="/oauth/authorize/submit">
<input type="hidden" name="client_id" value="{client_id}">
<input type="hidden" name="redirect_uri" value="{redirect_uri}">
<input type="hidden" name="state" value="{state}">
<input type="hidden" name="code_challenge" value="{code_challenge}">
<input type="hidden" name="code_challenge_method" value="{code_challenge_method}">
<input type="hidden" name="scope" value="{scope}">
<label for="token">Enter your MCP Bearer Token</label>
<input type="password" id="token" name="token" placeholder="Your MCP_BEARER_TOKEN" required autofocus>
<div class="buttons">
<button type="button" class="btn-deny" onclick="denyAccess()">Deny</button>
<button type="submit" class="btn-approve">Authorize</button>
</div>
</form>
</div>
<script>
function denyAccess() {{
  const redirectUri = document.querySelector('input[name="redirect_uri"]').value;
  const state = document.querySelector('input[name="state"]').value;
  const url = new URL(redirectUri);
  url.searchParams.set('error', 'access_denied');
  url.searchParams.set('error_description', 'User denied authorization');
  if (state) url.searchParams.set('state', state);
  window.location.href = url.toString();
}}
</script>
</body>
</html>"#,
        client_name = html_escape(&prompt.client_name),
        client_id = html_escape(&prompt.client_id),
        redirect_uri = html_escape(&prompt.redirect_uri),
        state = html_escape(&prompt.state),
        code_challenge = html_escape(&prompt.code_challenge),
        code_challenge_method = html_escape(&prompt.code_challenge_method),
        scope = html_escape(&prompt.scope),
    )
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> ConsentPrompt {
        ConsentPrompt {
            client_name: "Test App".to_string(),
            client_id: "client123".to_string(),
            redirect_uri: "https://app.example/cb".to_string(),
            state: "xyz".to_string(),
            code_challenge: "challenge1".to_string(),
            code_challenge_method: "S256".to_string(),
            scope: "mcp:tools".to_string(),
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<script>alert("xss")</script>"#),
            "&lt;script&gt;alert(&quot;xss&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_render_round_trips_flow_parameters() {
        let html = render_consent_page(&prompt());
        assert!(html.contains(r#"name="client_id" value="client123""#));
        assert!(html.contains(r#"name="state" value="xyz""#));
        assert!(html.contains(r#"name="code_challenge" value="challenge1""#));
        assert!(html.contains(r#"name="code_challenge_method" value="S256""#));
        assert!(html.contains("Test App"));
    }

    #[test]
    fn test_render_escapes_client_name() {
        let mut p = prompt();
        p.client_name = "<b>Sneaky</b>".to_string();
        let html = render_consent_page(&p);
        assert!(!html.contains("<b>Sneaky</b>"));
        assert!(html.contains("&lt;b&gt;Sneaky&lt;/b&gt;"));
    }
}
