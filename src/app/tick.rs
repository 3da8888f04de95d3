use super::App;

impl App {
    /// Called on every tick of the UI loop.
    ///
    /// Advances the typing indicator and drains events from background agent calls.
    pub fn on_tick(&mut self) {
        if self.chat.is_streaming {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        } else {
            self.spinner_frame = 0;
        }

        while let Some(event) = self.agent_manager.poll_event() {
            self.apply_agent_event(event);
        }
    }
}
