//! 落地页

/// 落地页内容
#[derive(Clone, Debug)]
pub struct LandingPage {
    pub title: String,
    pub sign_in_label: String,
    pub secondary_text: String,
    /// Service worker 脚本路径
    pub service_worker_url: String,
    pub manifest_url: String,
    pub theme_color: String,
}

impl Default for LandingPage {
    fn default() -> Self {
        Self {
            title: "Reppy".to_string(),
            sign_in_label: "Sign in with Google".to_string(),
            secondary_text: "or log in/create an account".to_string(),
            service_worker_url: "/sw.js".to_string(),
            manifest_url: "/manifest.webmanifest".to_string(),
            theme_color: "#ffffff".to_string(),
        }
    }
}

const CONTAINER_STYLE: &str = "background-color: white; min-height: 100vh; display: flex; \
flex-direction: column; align-items: center; justify-content: center; padding: 20px";

const HEADING_STYLE: &str = "color: #50514F; font-size: 48px; margin-bottom: 40px";

const BUTTON_STYLE: &str = "background-color: #F05D5E; color: white; padding: 15px 30px; \
border: none; border-radius: 8px; font-size: 18px; cursor: pointer; \
box-shadow: 0 2px 4px rgba(0,0,0,0.1); transition: transform 0.2s ease";

const SECONDARY_STYLE: &str = "color: #1a73e8; font-size: 14px; margin-top: 15px; cursor: pointer";

/// 渲染落地页 HTML
///
/// 按钮悬停时放大到 `scale(1.05)`，移出后恢复 `scale(1)`。
/// 浏览器支持 `serviceWorker` 时才注册 service worker。
pub fn render_landing_page(page: &LandingPage) -> String {
    let title = escape_html(&page.title);
    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <meta name="theme-color" content="{theme}" />
    <link rel="manifest" href="{manifest}" />
    <link rel="apple-touch-icon" href="/assets/reppy-logo-180.png" />
    <title>{title}</title>
  </head>
  <body style="margin: 0">
    <div id="root">
      <div class="app-container" style="{container}">
        <h1 style="{heading}">{title}</h1>
        <button type="button" style="{button}" onmouseover="this.style.transform = 'scale(1.05)'" onmouseout="this.style.transform = 'scale(1)'">{sign_in}</button>
        <p style="{secondary}">{secondary_text}</p>
      </div>
    </div>
    <script>
      if ('serviceWorker' in navigator) {{
        navigator.serviceWorker.register('{sw}')
      }}
    </script>
  </body>
</html>
"#,
        theme = escape_html(&page.theme_color),
        manifest = escape_html(&page.manifest_url),
        title = title,
        container = CONTAINER_STYLE,
        heading = HEADING_STYLE,
        button = BUTTON_STYLE,
        sign_in = escape_html(&page.sign_in_label),
        secondary = SECONDARY_STYLE,
        secondary_text = escape_html(&page.secondary_text),
        sw = escape_js_string(&page.service_worker_url),
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn escape_js_string(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('<', "\\u003c")
}
