#![allow(non_snake_case)]

use propdesk_frontend::app::App;

fn main() {
  dioxus::logger::init(dioxus::logger::tracing::Level::INFO).expect("failed to init logger");
  dioxus::launch(App);
}
