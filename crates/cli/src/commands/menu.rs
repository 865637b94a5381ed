use concierge_core::default_catalog;

pub fn run() -> String {
    default_catalog().menu_text()
}
