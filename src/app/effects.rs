use crate::app::{App, Message, Model, ToastLevel, update};
use crate::note::{NoteContent, Variant};
use crate::pairing::{ScanCapability, Scanner};
use crate::relay::RelayLink;

impl App {
    /// Build the starting model: restored plain note, capability from config.
    pub(super) fn initial_model(&self, terminal_size: (u16, u16)) -> Model {
        let mut restore_error = None;
        let content = match (self.variant, self.store.as_ref()) {
            (Variant::Plain, Some(store)) => match store.load() {
                Ok(Some(text)) => NoteContent::Plain(text),
                Ok(None) => NoteContent::empty(Variant::Plain),
                Err(err) => {
                    tracing::warn!(error = %err, "could not restore note");
                    restore_error = Some(err);
                    NoteContent::empty(Variant::Plain)
                }
            },
            (variant, _) => NoteContent::empty(variant),
        };
        let capability = ScanCapability::detect(self.device, self.camera.clone());
        let mut model = Model::new(content, capability, terminal_size);
        model.relay_url = self.relay.url.to_string();
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        if self.variant == Variant::Plain {
            model.store_path = self.store.as_ref().map(|s| s.path().to_path_buf());
        }
        if let Some(err) = restore_error {
            model.show_toast(ToastLevel::Warning, format!("Note not restored: {err:#}"));
        }
        model
    }

    /// Run one message through `update`, then carry out what it queued.
    pub(super) fn dispatch(&self, model: &mut Model, link: &mut dyn RelayLink, msg: Message) {
        crate::perf::log_event("event.message", format!("msg={}", message_label(&msg)));
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        self.handle_message_side_effects(model, link, &side_msg);
    }

    pub(super) fn handle_message_side_effects(
        &self,
        model: &mut Model,
        link: &mut dyn RelayLink,
        msg: &Message,
    ) {
        match msg {
            Message::RelayConnected(session_id) => {
                crate::perf::log_event("relay.connected", format!("sid={session_id}"));
            }
            Message::RelayDisconnected(reason) => {
                crate::perf::log_event("relay.disconnected", reason);
            }
            Message::ScanDecoded(_) => {
                crate::perf::log_event(
                    "pairing.scanned",
                    format!("target={}", model.target.as_deref().unwrap_or("")),
                );
            }
            _ => {}
        }

        if let Some(outbound) = model.take_pending_update() {
            crate::perf::log_event("relay.send", format!("target={}", outbound.target));
            link.send_update(outbound);
        }

        if model.take_persist_request()
            && let Some(store) = &self.store
            && let Err(err) = store.save(&model.note.text())
        {
            tracing::warn!(error = %err, "could not persist note");
            model.show_toast(ToastLevel::Error, format!("Save failed: {err:#}"));
        }
    }

    /// Keep a scanner running exactly while the scanner region is shown.
    pub(super) fn sync_scanner(model: &mut Model, scanner: &mut Option<Scanner>) {
        if !model.scanner_visible() {
            if scanner.take().is_some() {
                tracing::debug!("scanner stopped");
            }
            return;
        }
        if scanner.is_some() {
            return;
        }
        let ScanCapability::Camera(path) = &model.capability else {
            return;
        };
        match Scanner::start(path) {
            Ok(started) => *scanner = Some(started),
            Err(err) => {
                tracing::warn!(error = %err, "camera unavailable");
                model.capability = ScanCapability::NoCamera;
                model.show_toast(ToastLevel::Warning, format!("Camera unavailable: {err}"));
            }
        }
    }
}

/// Short label for the debug log; note payloads can be large.
fn message_label(msg: &Message) -> String {
    match msg {
        Message::RemoteUpdate { from, .. } => format!("RemoteUpdate(from={from})"),
        Message::InsertText(text) => format!("InsertText(len={})", text.len()),
        other => format!("{other:?}"),
    }
}
