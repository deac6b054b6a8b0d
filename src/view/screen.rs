//! Screen coordinator

use super::{Panel, Size, ViewState, Viewer};
use crate::clothing::ClothingItem;
use crate::ingest::{self, IngestError};
use crate::notify::{Notifier, Toast};
use crate::persistence::{ListStore, PersistentList, append};
use crate::platform::{CancellationToken, KeyValueStore, UploadedFile};
use crate::settings::Settings;

/// One mounted try-on screen
pub struct TryOnScreen<S> {
    storage: S,
    clothing: Vec<ClothingItem>,
    cart: PersistentList<ClothingItem, S>,
    wishlist: PersistentList<ClothingItem, S>,
    view: ViewState,
    settings: Settings,
    /// Cancelled on unmount; every model decode holds a clone
    lifetime: CancellationToken,
    decodes_in_flight: usize,
    notifier: Box<dyn Notifier>,
    viewer: Box<dyn Viewer>,
}

impl<S: KeyValueStore + Clone> TryOnScreen<S> {
    /// Mount the screen: seed cart and wishlist from storage, load settings,
    /// and show the (empty) clothing list.
    pub fn mount(storage: S, notifier: Box<dyn Notifier>, viewer: Box<dyn Viewer>) -> Self {
        let cart = PersistentList::open(ListStore::cart(storage.clone()));
        let wishlist = PersistentList::open(ListStore::wishlist(storage.clone()));
        let settings = Settings::load(&storage);

        let mut screen = Self {
            storage,
            clothing: Vec::new(),
            cart,
            wishlist,
            view: ViewState::default(),
            settings,
            lifetime: CancellationToken::new(),
            decodes_in_flight: 0,
            notifier,
            viewer,
        };
        log::info!(
            "Try-on screen mounted (cart {}, wishlist {})",
            screen.cart.len(),
            screen.wishlist.len()
        );
        screen.present();
        screen
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn clothing(&self) -> &[ClothingItem] {
        &self.clothing
    }

    pub fn cart(&self) -> &[ClothingItem] {
        self.cart.items()
    }

    pub fn wishlist(&self) -> &[ClothingItem] {
        self.wishlist.items()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_mounted(&self) -> bool {
        !self.lifetime.is_cancelled()
    }

    pub fn toggle(&mut self, panel: Panel) {
        self.view.toggle(panel);
    }

    pub fn toggle_sidebar(&mut self) {
        self.toggle(Panel::Sidebar);
    }

    pub fn toggle_settings(&mut self) {
        self.toggle(Panel::Settings);
    }

    pub fn toggle_chat(&mut self) {
        self.toggle(Panel::Chat);
    }

    pub fn set_size(&mut self, size: Size) {
        if self.view.size != size {
            self.view.size = size;
            self.present();
        }
    }

    /// Add an image item. No file selected does nothing.
    pub fn add_image<F: UploadedFile>(&mut self, file: Option<&F>) {
        match ingest::ingest_image(file) {
            Ok(Some(item)) => {
                self.push_clothing(item);
                self.notify_success("Image uploaded successfully");
            }
            Ok(None) => {}
            Err(e) => self.notify_failure(&e),
        }
    }

    /// Start a model decode; hand the returned token to `ingest_model` and
    /// back to `finish_model_ingest`.
    ///
    /// Returns `None` (and shows an error toast) while unmounted.
    pub fn begin_model_ingest(&mut self) -> Option<CancellationToken> {
        if !self.is_mounted() {
            log::warn!("Model upload ignored: screen is not mounted");
            self.notifier
                .notify(Toast::error("The try-on screen is not active, reload the page"));
            return None;
        }
        self.decodes_in_flight += 1;
        self.view.loading = true;
        Some(self.lifetime.clone())
    }

    /// Apply the outcome of a model decode started with `begin_model_ingest`.
    ///
    /// Outcomes of decodes started before the last unmount are dropped; they
    /// no longer count towards `loading`. Overlapping decodes are allowed;
    /// items are appended in completion order.
    pub fn finish_model_ingest(
        &mut self,
        token: &CancellationToken,
        outcome: Result<Option<ClothingItem>, IngestError>,
    ) {
        if token.is_cancelled() {
            log::debug!("Dropping model decode that finished after unmount");
            return;
        }
        self.decodes_in_flight = self.decodes_in_flight.saturating_sub(1);
        self.view.loading = self.decodes_in_flight > 0;

        match outcome {
            Ok(Some(item)) => {
                self.push_clothing(item);
                self.notify_success("3D model loaded successfully");
            }
            Ok(None) => {}
            Err(IngestError::Cancelled) => log::debug!("Model decode cancelled"),
            Err(e) => self.notify_failure(&e),
        }
    }

    /// Copy the clothing item at `index` into the cart
    pub fn add_to_cart(&mut self, index: usize) -> bool {
        let Some(item) = self.clothing.get(index).cloned() else {
            log::warn!("No clothing item {} to add to cart", index);
            return false;
        };
        self.cart.push(item);
        true
    }

    /// Copy the clothing item at `index` into the wishlist
    pub fn add_to_wishlist(&mut self, index: usize) -> bool {
        let Some(item) = self.clothing.get(index).cloned() else {
            log::warn!("No clothing item {} to add to wishlist", index);
            return false;
        };
        self.wishlist.push(item);
        true
    }

    /// Edit and save settings
    pub fn update_settings(&mut self, edit: impl FnOnce(&mut Settings)) {
        let before = self.settings.clone();
        edit(&mut self.settings);
        if self.settings != before {
            self.settings.save(&self.storage);
            self.present();
        }
    }

    /// Tear the screen down; pending decodes will be ignored
    pub fn unmount(&mut self) {
        if self.is_mounted() {
            self.lifetime.cancel();
            self.decodes_in_flight = 0;
            self.view.loading = false;
            log::info!("Try-on screen unmounted");
        }
    }

    /// Bring an unmounted screen back (page restored from the back/forward
    /// cache). Decodes from before the unmount stay cancelled.
    pub fn remount(&mut self) {
        if !self.is_mounted() {
            self.lifetime = CancellationToken::new();
            log::info!("Try-on screen remounted");
            self.present();
        }
    }

    fn push_clothing(&mut self, item: ClothingItem) {
        log::info!("Added clothing item: {}", item.label());
        self.clothing = append(&self.clothing, item);
        self.present();
    }

    fn present(&mut self) {
        self.viewer
            .present(&self.clothing, self.view.size, &self.settings);
    }

    fn notify_success(&self, message: &str) {
        if self.settings.toasts {
            self.notifier.notify(Toast::success(message));
        }
    }

    fn notify_failure(&self, error: &IngestError) {
        log::warn!("Ingestion failed: {}", error);
        self.notifier.notify(Toast::error(error.to_string()));
    }
}

impl<S> Drop for TryOnScreen<S> {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::ingest::GlbLoader;
    use crate::ingest::glb;
    use crate::notify::{ToastKind, ToastLog};
    use crate::platform::{MemoryStorage, PickedFile};

    /// Viewer that records each presented (item count, size)
    #[derive(Clone, Default)]
    struct RecordingViewer {
        frames: Rc<RefCell<Vec<(usize, f32)>>>,
    }

    impl Viewer for RecordingViewer {
        fn present(&mut self, items: &[ClothingItem], size: Size, _settings: &Settings) {
            self.frames.borrow_mut().push((items.len(), size.get()));
        }
    }

    struct Harness {
        storage: MemoryStorage,
        toasts: ToastLog,
        viewer: RecordingViewer,
        screen: TryOnScreen<MemoryStorage>,
    }

    fn mount(storage: MemoryStorage) -> Harness {
        let toasts = ToastLog::new();
        let viewer = RecordingViewer::default();
        let screen = TryOnScreen::mount(
            storage.clone(),
            Box::new(toasts.clone()),
            Box::new(viewer.clone()),
        );
        Harness {
            storage,
            toasts,
            viewer,
            screen,
        }
    }

    fn png(name: &str) -> PickedFile {
        PickedFile::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    fn run_model_ingest(screen: &mut TryOnScreen<MemoryStorage>, file: &PickedFile) {
        let token = screen.begin_model_ingest().unwrap();
        assert!(screen.view().loading);
        let outcome = pollster::block_on(ingest::ingest_model(Some(file), &GlbLoader, &token));
        screen.finish_model_ingest(&token, outcome);
    }

    #[test]
    fn test_mount_seeds_lists_from_storage() {
        let storage = MemoryStorage::new();
        storage
            .set_item("cart", r#"[{"src":"a.png","rotation":0}]"#)
            .unwrap();
        storage.set_item("wishlist", "garbage").unwrap();

        let h = mount(storage);
        assert_eq!(h.screen.cart(), &[ClothingItem::image("a.png")]);
        assert!(h.screen.wishlist().is_empty());
        assert!(h.screen.clothing().is_empty());
        assert_eq!(h.viewer.frames.borrow().as_slice(), &[(0usize, 1.0f32)]);
    }

    #[test]
    fn test_add_image_and_copy_to_lists() {
        let mut h = mount(MemoryStorage::new());

        h.screen.add_image(Some(&png("tee.png")));
        assert_eq!(h.screen.clothing().len(), 1);
        assert_eq!(h.toasts.toasts(), vec![Toast::success("Image uploaded successfully")]);

        assert!(h.screen.add_to_cart(0));
        assert!(h.screen.add_to_cart(0));
        assert!(h.screen.add_to_wishlist(0));
        assert!(!h.screen.add_to_wishlist(3));

        assert_eq!(h.screen.cart().len(), 2);
        assert_eq!(h.screen.wishlist().len(), 1);

        // Stored lists match the mirrors
        let reloaded = ListStore::cart(h.storage.clone()).load();
        assert_eq!(reloaded, h.screen.cart());
        assert_eq!(ListStore::wishlist(h.storage.clone()).load().len(), 1);
    }

    #[test]
    fn test_no_file_is_silent() {
        let mut h = mount(MemoryStorage::new());
        h.screen.add_image::<PickedFile>(None);

        assert!(h.screen.clothing().is_empty());
        assert!(h.toasts.is_empty());
    }

    #[test]
    fn test_model_ingest_appends_and_clears_loading() {
        let mut h = mount(MemoryStorage::new());
        let file = PickedFile::new(
            "jacket.glb",
            "model/gltf-binary",
            glb::pack(r#"{ "nodes": [ { "name": "Jacket" } ] }"#, None),
        );

        run_model_ingest(&mut h.screen, &file);

        assert!(!h.screen.view().loading);
        assert_eq!(h.screen.clothing().len(), 1);
        assert!(h.screen.clothing()[0].is_model());
        assert_eq!(h.toasts.toasts()[0], Toast::success("3D model loaded successfully"));
    }

    #[test]
    fn test_rejected_model_leaves_list_unchanged() {
        let mut h = mount(MemoryStorage::new());
        h.screen.add_image(Some(&png("tee.png")));
        let before = h.screen.clothing().to_vec();

        let file = PickedFile::new("broken.glb", "", b"not a model".to_vec());
        run_model_ingest(&mut h.screen, &file);

        assert_eq!(h.screen.clothing(), before.as_slice());
        assert!(!h.screen.view().loading);
        let last = h.toasts.toasts().pop().unwrap();
        assert_eq!(last.kind, ToastKind::Error);
        assert!(last.message.contains("broken.glb"));
    }

    #[test]
    fn test_decode_finishing_after_unmount_is_dropped() {
        let mut h = mount(MemoryStorage::new());
        let file = PickedFile::new("jacket.glb", "", glb::pack(r#"{ "nodes": [ {} ] }"#, None));

        let token = h.screen.begin_model_ingest().unwrap();
        h.screen.unmount();
        let outcome = pollster::block_on(ingest::ingest_model(Some(&file), &GlbLoader, &token));
        h.screen.finish_model_ingest(&token, outcome);

        assert!(!h.screen.is_mounted());
        assert!(!h.screen.view().loading);
        assert!(h.screen.clothing().is_empty());
        assert!(h.toasts.is_empty());
    }

    #[test]
    fn test_upload_while_unmounted_is_refused_visibly() {
        let mut h = mount(MemoryStorage::new());
        h.screen.unmount();

        assert!(h.screen.begin_model_ingest().is_none());
        assert!(!h.screen.view().loading);
        assert_eq!(h.toasts.toasts()[0].kind, ToastKind::Error);
    }

    #[test]
    fn test_remount_accepts_uploads_and_ignores_stale_decodes() {
        let mut h = mount(MemoryStorage::new());
        let file = PickedFile::new("jacket.glb", "", glb::pack(r#"{ "nodes": [ {} ] }"#, None));

        let stale = h.screen.begin_model_ingest().unwrap();
        h.screen.unmount();
        h.screen.remount();
        assert!(h.screen.is_mounted());

        let fresh = h.screen.begin_model_ingest().unwrap();
        let outcome = pollster::block_on(ingest::ingest_model(Some(&file), &GlbLoader, &stale));
        h.screen.finish_model_ingest(&stale, outcome);
        // The decode started after remount is still running
        assert!(h.screen.view().loading);
        assert!(h.screen.clothing().is_empty());

        let outcome = pollster::block_on(ingest::ingest_model(Some(&file), &GlbLoader, &fresh));
        h.screen.finish_model_ingest(&fresh, outcome);
        assert!(!h.screen.view().loading);
        assert_eq!(h.screen.clothing().len(), 1);
    }

    #[test]
    fn test_overlapping_decodes_keep_loading_until_last() {
        let mut h = mount(MemoryStorage::new());
        let file = PickedFile::new("a.glb", "", glb::pack(r#"{ "nodes": [ {} ] }"#, None));

        let first = h.screen.begin_model_ingest().unwrap();
        let second = h.screen.begin_model_ingest().unwrap();

        let outcome = pollster::block_on(ingest::ingest_model(Some(&file), &GlbLoader, &second));
        h.screen.finish_model_ingest(&second, outcome);
        assert!(h.screen.view().loading);

        let outcome = pollster::block_on(ingest::ingest_model(Some(&file), &GlbLoader, &first));
        h.screen.finish_model_ingest(&first, outcome);
        assert!(!h.screen.view().loading);
        assert_eq!(h.screen.clothing().len(), 2);
    }

    #[test]
    fn test_size_and_panels() {
        let mut h = mount(MemoryStorage::new());
        h.screen.toggle_sidebar();
        h.screen.toggle_settings();
        h.screen.toggle_chat();
        h.screen.toggle_settings();

        let view = h.screen.view();
        assert!(view.sidebar_open && view.chat_open && !view.settings_open);

        h.screen.set_size(Size::new(2.0).unwrap());
        assert_eq!(h.screen.view().size.get(), 2.0);
        assert_eq!(h.viewer.frames.borrow().last(), Some(&(0, 2.0)));
    }

    #[test]
    fn test_storage_failure_keeps_cart_in_memory() {
        let mut h = mount(MemoryStorage::with_quota(4));
        h.screen.add_image(Some(&png("a-long-name.png")));

        assert!(h.screen.add_to_cart(0));
        assert_eq!(h.screen.cart().len(), 1);
        assert_eq!(h.storage.get_item("cart").unwrap(), None);
    }

    #[test]
    fn test_settings_persist_and_mute_success_toasts() {
        let mut h = mount(MemoryStorage::new());
        h.screen.update_settings(|s| s.toasts = false);
        h.screen.add_image(Some(&png("tee.png")));
        assert!(h.toasts.is_empty());

        let reloaded = Settings::load(&h.storage);
        assert!(!reloaded.toasts);

        // Errors still show
        h.screen.add_image(Some(&PickedFile::new("x.txt", "text/plain", vec![])));
        assert_eq!(h.toasts.toasts()[0].kind, ToastKind::Error);
    }
}
