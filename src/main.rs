//! Try-On entry point
//!
//! Mounts the screen on the page and wires DOM events to it.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlInputElement, HtmlSelectElement};

    use tryon::QualityPreset;
    use tryon::ingest::{self, GlbLoader};
    use tryon::notify::DomNotifier;
    use tryon::platform::web::WebFile;
    use tryon::platform::{KeyValueStore, LocalStorage, MemoryStorage};
    use tryon::view::{PageViewer, Panel, Size, TryOnScreen};

    type Screen<S> = Rc<RefCell<TryOnScreen<S>>>;

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Try-on screen starting...");

        match LocalStorage::open() {
            Ok(storage) => start(storage),
            Err(e) => {
                log::warn!("{} - cart and wishlist will not survive a reload", e);
                start(MemoryStorage::new());
            }
        }
    }

    fn start<S: KeyValueStore + Clone + 'static>(storage: S) {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .expect("no document");

        let screen = Rc::new(RefCell::new(TryOnScreen::mount(
            storage,
            Box::new(DomNotifier),
            Box::new(PageViewer),
        )));

        setup_file_inputs(&document, screen.clone());
        setup_size_slider(&document, screen.clone());
        setup_panel_toggles(&document, screen.clone());
        setup_settings_panel(&document, screen.clone());
        setup_card_buttons(&document, screen.clone());
        setup_unmount(screen.clone());

        refresh_dom(&document, &screen.borrow());
        log::info!("Try-on screen running!");
    }

    fn input_by_id(document: &Document, id: &str) -> Option<HtmlInputElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn setup_file_inputs<S: KeyValueStore + Clone + 'static>(document: &Document, screen: Screen<S>) {
        // Image upload
        if let Some(input) = input_by_id(document, "image-input") {
            let screen = screen.clone();
            let input_clone = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let file = WebFile::from_input(&input_clone);
                screen.borrow_mut().add_image(file.as_ref());
                input_clone.set_value("");
                refresh_page(&screen);
            });
            let _ = input.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Model upload
        if let Some(input) = input_by_id(document, "model-input") {
            let input_clone = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let Some(file) = WebFile::from_input(&input_clone) else {
                    return;
                };
                input_clone.set_value("");

                let token = screen.borrow_mut().begin_model_ingest();
                refresh_page(&screen);
                let Some(token) = token else {
                    return;
                };

                let screen = screen.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let outcome = ingest::ingest_model(Some(&file), &GlbLoader, &token).await;
                    screen.borrow_mut().finish_model_ingest(&token, outcome);
                    refresh_page(&screen);
                });
            });
            let _ = input.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_size_slider<S: KeyValueStore + Clone + 'static>(document: &Document, screen: Screen<S>) {
        let Some(slider) = input_by_id(document, "size-slider") else {
            return;
        };
        let slider_clone = slider.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            match Size::parse(&slider_clone.value()) {
                Some(size) => screen.borrow_mut().set_size(size),
                None => log::warn!("Ignoring size {:?}", slider_clone.value()),
            }
            refresh_page(&screen);
        });
        let _ = slider.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_panel_toggles<S: KeyValueStore + Clone + 'static>(document: &Document, screen: Screen<S>) {
        for (id, panel) in [
            ("sidebar-toggle", Panel::Sidebar),
            ("settings-toggle", Panel::Settings),
            ("chat-toggle", Panel::Chat),
        ] {
            if let Some(btn) = document.get_element_by_id(id) {
                let screen = screen.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                    screen.borrow_mut().toggle(panel);
                    refresh_page(&screen);
                });
                let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_settings_panel<S: KeyValueStore + Clone + 'static>(document: &Document, screen: Screen<S>) {
        let checkboxes: [(&str, fn(&mut tryon::Settings, bool)); 3] = [
            ("setting-auto-rotate", |s, on| s.auto_rotate = on),
            ("setting-reduced-motion", |s, on| s.reduced_motion = on),
            ("setting-toasts", |s, on| s.toasts = on),
        ];
        for (id, apply) in checkboxes {
            if let Some(input) = input_by_id(document, id) {
                let screen = screen.clone();
                let input_clone = input.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                    let on = input_clone.checked();
                    screen.borrow_mut().update_settings(|s| apply(s, on));
                    refresh_page(&screen);
                });
                let _ = input.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        let quality: Option<HtmlSelectElement> = document
            .get_element_by_id("setting-quality")
            .and_then(|el| el.dyn_into().ok());
        if let Some(select) = quality {
            let select_clone = select.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Some(preset) = QualityPreset::from_str(&select_clone.value()) {
                    screen.borrow_mut().update_settings(|s| s.quality = preset);
                    refresh_page(&screen);
                }
            });
            let _ = select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Card buttons are re-rendered on every change, so listen on the container
    fn setup_card_buttons<S: KeyValueStore + Clone + 'static>(document: &Document, screen: Screen<S>) {
        let Some(cards) = document.get_element_by_id("clothing-cards") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MouseEvent| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let index_of = |attr: &str| -> Option<usize> {
                target
                    .closest(&format!("[{}]", attr))
                    .ok()
                    .flatten()?
                    .get_attribute(attr)?
                    .parse()
                    .ok()
            };
            if let Some(index) = index_of("data-cart") {
                screen.borrow_mut().add_to_cart(index);
            } else if let Some(index) = index_of("data-wishlist") {
                screen.borrow_mut().add_to_wishlist(index);
            } else {
                return;
            }
            refresh_page(&screen);
        });
        let _ = cards.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_unmount<S: KeyValueStore + Clone + 'static>(screen: Screen<S>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Leaving the page (possibly into the back/forward cache)
        {
            let screen = screen.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                screen.borrow_mut().unmount();
            });
            let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Restored from the back/forward cache
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                screen.borrow_mut().remount();
                refresh_page(&screen);
            });
            let _ = window.add_event_listener_with_callback("pageshow", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn refresh_page<S: KeyValueStore + Clone>(screen: &Screen<S>) {
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            refresh_dom(&document, &screen.borrow());
        }
    }

    /// Sync panels, badges, loading indicator and cards with the screen
    fn refresh_dom<S: KeyValueStore + Clone>(document: &Document, screen: &TryOnScreen<S>) {
        let view = screen.view();

        for (id, panel) in [
            ("sidebar", Panel::Sidebar),
            ("settings-panel", Panel::Settings),
            ("chat-panel", Panel::Chat),
        ] {
            if let Some(el) = document.get_element_by_id(id) {
                let _ = el.class_list().toggle_with_force("open", view.is_open(panel));
            }
        }

        if let Some(el) = document.get_element_by_id("loading") {
            let _ = el.class_list().toggle_with_force("hidden", !view.loading);
        }
        if let Some(el) = document.get_element_by_id("size-value") {
            el.set_text_content(Some(&format!("{:.1}", view.size.get())));
        }
        if let Some(el) = document.get_element_by_id("cart-count") {
            el.set_text_content(Some(&screen.cart().len().to_string()));
        }
        if let Some(el) = document.get_element_by_id("wishlist-count") {
            el.set_text_content(Some(&screen.wishlist().len().to_string()));
        }

        if let Some(cards) = document.get_element_by_id("clothing-cards") {
            cards.set_text_content(None);
            for (index, item) in screen.clothing().iter().enumerate() {
                if let Some(card) = build_card(document, index, &item.label()) {
                    let _ = cards.append_child(&card);
                }
            }
        }
    }

    fn build_card(document: &Document, index: usize, label: &str) -> Option<Element> {
        let card = document.create_element("div").ok()?;
        let _ = card.set_attribute("class", "clothing-card");

        let title = document.create_element("span").ok()?;
        title.set_text_content(Some(label));
        card.append_child(&title).ok()?;

        for (attr, text) in [("data-cart", "Add to cart"), ("data-wishlist", "Add to wishlist")] {
            let btn = document.create_element("button").ok()?;
            let _ = btn.set_attribute(attr, &index.to_string());
            btn.set_text_content(Some(text));
            card.append_child(&btn).ok()?;
        }
        Some(card)
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use tryon::ingest::{self, GlbLoader, glb};
    use tryon::platform::{MemoryStorage, PickedFile};
    use tryon::view::{LogViewer, Size};
    use tryon::{ToastLog, TryOnScreen};

    env_logger::init();
    log::info!("Try-on (native) starting...");
    log::info!("The viewer needs a browser - build for wasm32 and serve with `trunk serve`");

    // Scripted session against in-memory storage
    let storage = MemoryStorage::new();
    let toasts = ToastLog::new();
    let mut screen = TryOnScreen::mount(
        storage.clone(),
        Box::new(toasts.clone()),
        Box::new(LogViewer::default()),
    );

    screen.add_image(Some(&PickedFile::new("tee.png", "image/png", vec![0x89, b'P', b'N', b'G'])));

    let model = PickedFile::new(
        "jacket.glb",
        "model/gltf-binary",
        glb::pack(
            r#"{ "asset": { "version": "2.0" }, "nodes": [ { "name": "Jacket" } ] }"#,
            None,
        ),
    );
    if let Some(token) = screen.begin_model_ingest() {
        let outcome = pollster::block_on(ingest::ingest_model(Some(&model), &GlbLoader, &token));
        screen.finish_model_ingest(&token, outcome);
    }

    if let Some(size) = Size::new(1.2) {
        screen.set_size(size);
    }
    screen.add_to_cart(0);
    screen.add_to_wishlist(1);

    println!(
        "\n{} clothing items, cart {}, wishlist {}, {} toasts",
        screen.clothing().len(),
        screen.cart().len(),
        screen.wishlist().len(),
        toasts.len()
    );
    screen.unmount();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
