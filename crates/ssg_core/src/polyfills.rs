//! Pure polyfill generation for the server render runtime.
//!
//! The server bundle runs in a bare V8 isolate, so the handful of Node and
//! browser globals Vue's server renderer reaches for are provided here. The
//! mock DOM is only emitted when requested and lives in the runtime it is
//! installed into.

use serde::Serialize;

use crate::error::{Result, SsgCoreError};

/// Values exposed to the bundle as `globalThis.__SSG_CONFIG__`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig<'a> {
    pub page: &'a str,
    pub route_path: Option<&'a str>,
    pub mock: bool,
}

/// Generate the polyfill prelude executed before the server bundle.
///
/// The config is injected through `JSON.parse` of a double-encoded string so
/// nothing in it is ever evaluated as code.
pub fn generate_polyfills(config: &RenderConfig<'_>, node_env: &str) -> Result<String> {
    let config_json =
        serde_json::to_string(config).map_err(|e| SsgCoreError::Serialization(e.to_string()))?;
    let config_json_escaped = serde_json::to_string(&config_json)
        .map_err(|e| SsgCoreError::Serialization(e.to_string()))?;

    let node_env_escaped = node_env.replace('\\', "\\\\").replace('\'', "\\'");
    let mock_dom = if config.mock { MOCK_DOM_POLYFILL } else { "" };

    Ok(format!(
        r#"
globalThis.__SSG_CONFIG__ = JSON.parse({config_json_escaped});

globalThis.process = {{
    env: {{ NODE_ENV: '{node_env_escaped}', VITE_SSG: 'true' }},
    nextTick: (fn, ...args) => queueMicrotask(() => fn(...args)),
    platform: 'deno',
    versions: {{}},
}};
globalThis.global = globalThis;

{CONSOLE_POLYFILL}
{PERFORMANCE_POLYFILL}
{MESSAGE_CHANNEL_POLYFILL}
{TEXT_ENCODER_POLYFILL}
{mock_dom}
"#
    ))
}

const CONSOLE_POLYFILL: &str = r#"
const __ssgFormat = (args) => args.map(a => typeof a === 'object' ? JSON.stringify(a) : String(a)).join(' ');
globalThis.console = {
    log: (...args) => Deno.core.print('[vite-ssg:js] ' + __ssgFormat(args) + '\n', false),
    info: (...args) => Deno.core.print('[vite-ssg:js] ' + __ssgFormat(args) + '\n', false),
    warn: (...args) => Deno.core.print('[vite-ssg:js WARN] ' + __ssgFormat(args) + '\n', true),
    error: (...args) => Deno.core.print('[vite-ssg:js ERROR] ' + __ssgFormat(args) + '\n', true),
    debug: () => {},
    trace: () => {},
};
"#;

const PERFORMANCE_POLYFILL: &str = r#"
const performanceStart = Date.now();
globalThis.performance = { now: () => Date.now() - performanceStart, mark: () => {}, measure: () => {} };
"#;

const MESSAGE_CHANNEL_POLYFILL: &str = r#"
class MessageChannelPolyfill {
    constructor() {
        this.port1 = {
            postMessage: (data) => { if (this.port2.onmessage) queueMicrotask(() => this.port2.onmessage({ data })); },
            onmessage: null,
            close: () => {},
        };
        this.port2 = {
            postMessage: (data) => { if (this.port1.onmessage) queueMicrotask(() => this.port1.onmessage({ data })); },
            onmessage: null,
            close: () => {},
        };
    }
}
globalThis.MessageChannel = MessageChannelPolyfill;
"#;

const TEXT_ENCODER_POLYFILL: &str = r#"
class TextEncoderPolyfill {
    get encoding() { return 'utf-8'; }
    encode(str = '') {
        const utf8 = unescape(encodeURIComponent(str));
        const result = new Uint8Array(utf8.length);
        for (let i = 0; i < utf8.length; i++) result[i] = utf8.charCodeAt(i);
        return result;
    }
}
globalThis.TextEncoder = TextEncoderPolyfill;

class TextDecoderPolyfill {
    constructor(label = 'utf-8') { this.encoding = label.toLowerCase(); }
    decode(input) {
        if (!input) return '';
        const bytes = input instanceof Uint8Array ? input : new Uint8Array(input);
        let result = '';
        for (let i = 0; i < bytes.length; i++) result += String.fromCharCode(bytes[i]);
        return decodeURIComponent(escape(result));
    }
}
globalThis.TextDecoder = TextDecoderPolyfill;
"#;

/// Minimal `window`/`document` stand-ins for modules that touch the DOM while
/// being evaluated.
const MOCK_DOM_POLYFILL: &str = r#"
class MockNode {
    constructor(tagName = '') {
        this.tagName = tagName.toUpperCase();
        this.nodeName = this.tagName;
        this.children = [];
        this.childNodes = this.children;
        this.attributes = {};
        this.style = {};
        this.classList = { add() {}, remove() {}, toggle() {}, contains: () => false };
        this.textContent = '';
        this.innerHTML = '';
        this.parentNode = null;
    }
    appendChild(child) { this.children.push(child); child.parentNode = this; return child; }
    insertBefore(child) { return this.appendChild(child); }
    removeChild(child) { this.children = this.children.filter(c => c !== child); this.childNodes = this.children; return child; }
    setAttribute(name, value) { this.attributes[name] = String(value); }
    getAttribute(name) { return name in this.attributes ? this.attributes[name] : null; }
    removeAttribute(name) { delete this.attributes[name]; }
    hasAttribute(name) { return name in this.attributes; }
    addEventListener() {}
    removeEventListener() {}
    dispatchEvent() { return true; }
    querySelector() { return null; }
    querySelectorAll() { return []; }
    getElementsByTagName() { return []; }
    getBoundingClientRect() { return { top: 0, left: 0, right: 0, bottom: 0, width: 0, height: 0 }; }
}

const mockDocument = new MockNode('#document');
mockDocument.documentElement = mockDocument.appendChild(new MockNode('html'));
mockDocument.head = mockDocument.documentElement.appendChild(new MockNode('head'));
mockDocument.body = mockDocument.documentElement.appendChild(new MockNode('body'));
mockDocument.title = '';
mockDocument.cookie = '';
mockDocument.readyState = 'complete';
mockDocument.createElement = (tag) => new MockNode(tag);
mockDocument.createElementNS = (_ns, tag) => new MockNode(tag);
mockDocument.createTextNode = (text) => { const node = new MockNode('#text'); node.textContent = String(text); return node; };
mockDocument.createComment = () => new MockNode('#comment');
mockDocument.getElementById = () => null;

const mockStorage = () => {
    const data = new Map();
    return {
        getItem: (key) => data.has(key) ? data.get(key) : null,
        setItem: (key, value) => { data.set(key, String(value)); },
        removeItem: (key) => { data.delete(key); },
        clear: () => data.clear(),
        get length() { return data.size; },
    };
};

const mockWindow = globalThis;
mockWindow.window = mockWindow;
mockWindow.self = mockWindow;
mockWindow.document = mockDocument;
mockWindow.navigator = { userAgent: 'vite-ssg', language: 'en', languages: ['en'] };
mockWindow.location = { href: 'http://localhost/', origin: 'http://localhost', protocol: 'http:', host: 'localhost', hostname: 'localhost', port: '', pathname: globalThis.__SSG_CONFIG__.routePath || '/', search: '', hash: '' };
mockWindow.localStorage = mockStorage();
mockWindow.sessionStorage = mockStorage();
mockWindow.addEventListener = () => {};
mockWindow.removeEventListener = () => {};
mockWindow.matchMedia = () => ({ matches: false, addListener() {}, removeListener() {}, addEventListener() {}, removeEventListener() {} });
mockWindow.getComputedStyle = () => ({ getPropertyValue: () => '' });
mockWindow.requestAnimationFrame = (fn) => { queueMicrotask(() => fn(performance.now())); return 0; };
mockWindow.cancelAnimationFrame = () => {};
mockWindow.HTMLElement = MockNode;
mockWindow.Element = MockNode;
mockWindow.Node = MockNode;
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mock: bool) -> RenderConfig<'static> {
        RenderConfig {
            page: "index",
            route_path: Some("/"),
            mock,
        }
    }

    #[test]
    fn test_generate_polyfills_contains_config() {
        let result = generate_polyfills(&config(false), "production").unwrap();
        assert!(result.contains("JSON.parse("));
        assert!(result.contains(r#"\"page\":\"index\""#));
        assert!(result.contains("NODE_ENV: 'production'"));
    }

    #[test]
    fn test_generate_polyfills_contains_runtime_globals() {
        let result = generate_polyfills(&config(false), "development").unwrap();
        assert!(result.contains("globalThis.console"));
        assert!(result.contains("globalThis.performance"));
        assert!(result.contains("globalThis.MessageChannel"));
        assert!(result.contains("globalThis.TextEncoder"));
        assert!(result.contains("globalThis.TextDecoder"));
    }

    #[test]
    fn test_mock_dom_only_when_requested() {
        let plain = generate_polyfills(&config(false), "production").unwrap();
        assert!(!plain.contains("mockWindow.document"));

        let mocked = generate_polyfills(&config(true), "production").unwrap();
        assert!(mocked.contains("mockWindow.document = mockDocument"));
        assert!(mocked.contains("mockWindow.localStorage"));
    }

    #[test]
    fn test_polyfills_node_env_injection() {
        let result = generate_polyfills(&config(false), "'; alert('xss'); '").unwrap();
        assert!(result.contains(r"NODE_ENV: '\'; alert(\'xss\'); \''"));
    }

    #[test]
    fn test_polyfills_config_cannot_break_out() {
        let page = "'); alert('xss'); ('";
        let config = RenderConfig {
            page,
            route_path: None,
            mock: false,
        };
        let result = generate_polyfills(&config, "production").unwrap();
        let line = result
            .lines()
            .find(|line| line.starts_with("globalThis.__SSG_CONFIG__"))
            .unwrap();
        // one JSON string literal: every inner quote is escaped
        assert!(line.contains(r#"JSON.parse("{\"page\":"#));
        assert!(line.ends_with(r#"\"mock\":false}");"#));
    }
}
