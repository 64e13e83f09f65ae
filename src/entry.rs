//! WebAssembly entry point

use std::cell::RefCell;
use std::io;

use wasm_bindgen::prelude::*;

use crate::dom::web::WebDom;
use crate::dom::{Dom, EventKind, ListenOptions, Target};
use crate::Page;

thread_local! {
    /// The initialized page lives as long as the module
    static PAGE: RefCell<Option<Page<WebDom>>> = const { RefCell::new(None) };
}

/// Buffers one formatted log record and writes it to the browser console
#[derive(Default)]
struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
    }
}

fn init_logging() {
    let result = tracing_subscriber::fmt()
        .with_writer(ConsoleWriter::default)
        .without_time()
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .try_init();
    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}

fn boot(dom: WebDom) {
    let page = Page::load(dom);
    PAGE.with(|slot| *slot.borrow_mut() = Some(page));
}

#[wasm_bindgen(start)]
pub fn start() {
    init_logging();

    let Some(dom) = WebDom::new() else {
        tracing::warn!("No browser document; page behavior not installed");
        return;
    };

    if dom.is_loading() {
        let ready = dom.clone();
        dom.listen(
            Target::Document,
            EventKind::DomContentLoaded,
            ListenOptions::once(),
            Box::new(move |_| boot(ready.clone())),
        );
    } else {
        boot(dom);
    }
}
