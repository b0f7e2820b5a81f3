use dotenvy::dotenv;

fn main() {
  // Tell Cargo that if the env file changes, to rerun this build script.
  println!("cargo::rerun-if-changed=.env");
  println!("cargo::rerun-if-env-changed=API_BASE_URL");

  // a missing .env is fine, the client falls back to its default base url
  let _ = dotenv();

  if let Ok(url) = std::env::var("API_BASE_URL") {
    println!("cargo::rustc-env=API_BASE_URL={}", url);
  }
}
