//! Service worker 脚本
//!
//! 安装后立即接管页面；应用壳缓存优先，激活时删除旧版本缓存

/// 应用壳资源，安装时必须全部缓存成功
pub const APP_SHELL: &[&str] = &["/", "/manifest.webmanifest"];

/// 图标，尽力缓存，单个失败不影响安装
pub const ICONS: &[&str] = &[
    "/assets/reppy-app-logo.png",
    "/assets/reppy-logo-192.png",
    "/assets/reppy-logo-180.png",
];

/// 缓存名带版本号，部署新版本后旧缓存失效
pub fn cache_name(version: &str) -> String {
    format!("reppy-shell-v{}", version)
}

fn js_array(paths: &[&str]) -> String {
    paths
        .iter()
        .map(|path| format!("'{}'", path))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn service_worker_script(cache_name: &str) -> String {
    let shell = js_array(APP_SHELL);
    let icons = js_array(ICONS);

    format!(
        r#"const CACHE_NAME = '{cache_name}';
const APP_SHELL = [{shell}];
const ICONS = [{icons}];

self.addEventListener('install', (event) => {{
  self.skipWaiting();
  event.waitUntil(
    caches.open(CACHE_NAME).then((cache) =>
      cache.addAll(APP_SHELL).then(() =>
        Promise.all(ICONS.map((url) => cache.add(url).catch(() => undefined)))
      )
    )
  );
}});

self.addEventListener('activate', (event) => {{
  event.waitUntil(
    caches.keys()
      .then((keys) => Promise.all(
        keys.filter((key) => key !== CACHE_NAME).map((key) => caches.delete(key))
      ))
      .then(() => self.clients.claim())
  );
}});

self.addEventListener('fetch', (event) => {{
  if (event.request.method !== 'GET') {{
    return;
  }}
  const url = new URL(event.request.url);
  if (url.origin !== self.location.origin) {{
    return;
  }}
  if (!APP_SHELL.includes(url.pathname) && !ICONS.includes(url.pathname)) {{
    return;
  }}
  event.respondWith(
    caches.match(event.request).then((cached) => cached || fetch(event.request))
  );
}});
"#
    )
}
