//! Toast notifications

use std::cell::RefCell;
use std::rc::Rc;

/// Most toasts shown in the page at once; older ones are removed first
pub const MAX_TOASTS: usize = 5;

/// How many of the oldest toasts to remove once `shown` are on the page
pub fn toasts_over_cap(shown: usize) -> usize {
    shown.saturating_sub(MAX_TOASTS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }
}

/// Fire-and-forget notification surface
pub trait Notifier {
    fn notify(&self, toast: Toast);
}

/// Records toasts (native runs and tests). Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct ToastLog {
    toasts: Rc<RefCell<Vec<Toast>>>,
}

impl ToastLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.toasts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.borrow().is_empty()
    }
}

impl Notifier for ToastLog {
    fn notify(&self, toast: Toast) {
        log::info!("[{}] {}", toast.kind.as_str(), toast.message);
        self.toasts.borrow_mut().push(toast);
    }
}

/// Appends toasts to `#toasts` in the page (WASM only)
#[cfg(target_arch = "wasm32")]
pub struct DomNotifier;

#[cfg(target_arch = "wasm32")]
impl Notifier for DomNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => log::info!("{}", toast.message),
            ToastKind::Error => log::warn!("{}", toast.message),
        }

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(container) = document.get_element_by_id("toasts") else {
            return;
        };
        if let Ok(el) = document.create_element("div") {
            let _ = el.set_attribute("class", &format!("toast {}", toast.kind.as_str()));
            el.set_text_content(Some(&toast.message));
            let _ = container.append_child(&el);
        }

        for _ in 0..toasts_over_cap(container.child_element_count() as usize) {
            match container.first_element_child() {
                Some(oldest) => oldest.remove(),
                None => break,
            }
        }
    }
}
