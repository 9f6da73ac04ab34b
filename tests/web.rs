use std::sync::Arc;

use actix_web::{
  cookie::Cookie,
  dev::ServiceResponse,
  http::{header, StatusCode},
  test, App,
};

use blogsite::{
  app::AppConfig,
  auth::*,
  db::{MemoryStore, Store, StoreConfig},
  middleware::Auth,
  models::*,
  services::{config_services, Services},
};

const CONFIG: &str = r#"
  servers = ["web"]

  [web]
  listen = "127.0.0.1:0"
  services = ["User", "Post", "Profile"]

  [db]
  url = "memory:"

  [session]
  secret = "integration-test-secret"
"#;

fn load_services(extra: &str) -> Services {
  let config = AppConfig::from_toml(&format!("{}\n{}", CONFIG, extra)).unwrap();
  config_services(&config, "web").unwrap()
}

fn memory(services: &Services) -> Arc<MemoryStore> {
  match services.store() {
    StoreConfig::Memory(store) => store.clone(),
    StoreConfig::Postgres(_) => panic!("expected the in-memory store"),
  }
}

macro_rules! init_app {
  ($services:expr) => {
    test::init_service(
      App::new()
        .wrap(Auth::optional())
        .configure(|web| $services.web_config(web))
    ).await
  };
}

async fn add_user(store: &MemoryStore, username: &str) -> User {
  let new_user = NewUser {
    username: username.to_string(),
    email: String::new(),
    password: pass::hash_password("correct horse battery").unwrap(),
  };
  store.create_user(&new_user).await.unwrap().unwrap()
}

async fn add_post(store: &MemoryStore, author: &User, title: &str) -> Post {
  let changes = PostChanges { title: title.to_string(), content: "Some content.".to_string() };
  store.create_post(author.id, &changes).await.unwrap()
}

fn session(services: &Services, user: &User) -> Cookie<'static> {
  let keys = services.keys();
  keys.session_cookie(user.generate_jwt(keys).unwrap())
}

fn location<B>(resp: &ServiceResponse<B>) -> String {
  resp.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_string()
}

fn response_cookie<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
  resp.response().cookies()
    .find(|c| c.name() == name)
    .map(|c| c.into_owned())
}

fn flash_list<B>(services: &Services, resp: &ServiceResponse<B>) -> Vec<Flash> {
  response_cookie(resp, FLASH_COOKIE)
    .map(|c| services.keys().decode_flash(c.value()))
    .unwrap_or_default()
}

fn flashes<B>(services: &Services, resp: &ServiceResponse<B>) -> Vec<String> {
  flash_list(services, resp).into_iter().map(|f| f.message).collect()
}

async fn body_text<B: actix_web::body::MessageBody>(resp: ServiceResponse<B>) -> String {
  let body = test::read_body(resp).await;
  String::from_utf8(body.to_vec()).unwrap()
}

#[actix_rt::test]
async fn home_lists_posts_newest_first() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  add_post(&store, &alice, "First post").await;
  add_post(&store, &alice, "Second post").await;
  let app = init_app!(services);

  let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let html = body_text(resp).await;
  let first = html.find("First post").unwrap();
  let second = html.find("Second post").unwrap();
  assert!(second < first);
}

#[actix_rt::test]
async fn missing_post_is_not_found() {
  let services = load_services("");
  let app = init_app!(services);

  let req = test::TestRequest::get().uri("/post/999/").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn like_toggles_on_and_off() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let bob = add_user(&store, "bob").await;
  let post = add_post(&store, &alice, "Likeable").await;
  let app = init_app!(services);
  let uri = format!("/post/{}/like/", post.id);

  let req = test::TestRequest::post().uri(&uri)
    .cookie(session(&services, &bob))
    .set_form(&[("next", "/")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp), "/");
  assert_eq!(flashes(&services, &resp), vec!["You liked this post."]);
  let summary = store.post_summary(Some(bob.id), post.id).await.unwrap().unwrap();
  assert_eq!(summary.like_count, 1);
  assert!(summary.liked);

  // Second toggle removes it; a foreign `next` falls back to the post page.
  let req = test::TestRequest::post().uri(&uri)
    .cookie(session(&services, &bob))
    .set_form(&[("next", "https://evil.example/")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp), format!("/post/{}/", post.id));
  assert_eq!(flashes(&services, &resp), vec!["You unliked this post."]);
  let summary = store.post_summary(Some(bob.id), post.id).await.unwrap().unwrap();
  assert_eq!(summary.like_count, 0);
  assert!(!summary.liked);
}

#[actix_rt::test]
async fn other_users_cannot_edit_or_delete() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let mallory = add_user(&store, "mallory").await;
  let post = add_post(&store, &alice, "Mine").await;
  let app = init_app!(services);

  let req = test::TestRequest::get().uri(&format!("/post/{}/edit/", post.id))
    .cookie(session(&services, &mallory))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::post().uri(&format!("/post/{}/edit/", post.id))
    .cookie(session(&services, &mallory))
    .set_form(&[("title", "Hijacked"), ("content", "nope")])
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::post().uri(&format!("/post/{}/delete/", post.id))
    .cookie(session(&services, &mallory))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

  let stored = store.post_by_id(post.id).await.unwrap().unwrap();
  assert_eq!(stored.title, "Mine");
}

#[actix_rt::test]
async fn author_updates_and_deletes() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let post = add_post(&store, &alice, "Draft").await;
  let app = init_app!(services);

  let req = test::TestRequest::post().uri(&format!("/post/{}/edit/", post.id))
    .cookie(session(&services, &alice))
    .set_form(&[("title", " Final "), ("content", "Done.")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(flashes(&services, &resp), vec!["Blog updated."]);
  let stored = store.post_by_id(post.id).await.unwrap().unwrap();
  assert_eq!(stored.title, "Final");
  assert!(stored.updated_at >= stored.created_at);

  let req = test::TestRequest::post().uri(&format!("/post/{}/delete/", post.id))
    .cookie(session(&services, &alice))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp), "/");
  assert_eq!(flash_list(&services, &resp), vec![Flash::info("Blog deleted.")]);
  assert!(store.post_by_id(post.id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn create_post_requires_login_and_valid_form() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let app = init_app!(services);

  let req = test::TestRequest::get().uri("/post/new/").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp), "/login/");

  let req = test::TestRequest::post().uri("/post/new/")
    .cookie(session(&services, &alice))
    .set_form(&[("title", ""), ("content", "body")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert!(body_text(resp).await.contains("This field is required."));
  assert!(store.list_posts(None).await.unwrap().is_empty());

  let req = test::TestRequest::post().uri("/post/new/")
    .cookie(session(&services, &alice))
    .set_form(&[("title", "Hello"), ("content", "World")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  let posts = store.list_posts(None).await.unwrap();
  assert_eq!(posts.len(), 1);
  assert_eq!(posts[0].author, "alice");
  assert_eq!(location(&resp), format!("/post/{}/", posts[0].post.id));
}

#[actix_rt::test]
async fn anonymous_comment_redirects_to_login() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let post = add_post(&store, &alice, "Quiet").await;
  let app = init_app!(services);

  let req = test::TestRequest::post().uri(&format!("/post/{}/", post.id))
    .set_form(&[("content", "drive-by")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp), "/login/");
  assert_eq!(flash_list(&services, &resp), vec![Flash::error("Please sign in to comment.")]);

  let req = test::TestRequest::post().uri(&format!("/post/{}/comment/", post.id))
    .set_form(&[("content", "drive-by")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp), "/login/");

  assert!(store.comments_for_post(post.id).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn signed_in_comments() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let bob = add_user(&store, "bob").await;
  let post = add_post(&store, &alice, "Talk to me").await;
  let app = init_app!(services);

  // Blank comment re-renders the page with the field error.
  let req = test::TestRequest::post().uri(&format!("/post/{}/", post.id))
    .cookie(session(&services, &bob))
    .set_form(&[("content", "   ")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert!(body_text(resp).await.contains("This field is required."));

  let req = test::TestRequest::post().uri(&format!("/post/{}/", post.id))
    .cookie(session(&services, &bob))
    .set_form(&[("content", "Nice post!")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp), format!("/post/{}/", post.id));
  assert_eq!(flashes(&services, &resp), vec!["Comment added."]);

  let req = test::TestRequest::post().uri(&format!("/post/{}/comment/", post.id))
    .cookie(session(&services, &bob))
    .set_form(&[("content", "")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(flashes(&services, &resp), vec!["Please correct the comment and try again."]);

  let comments = store.comments_for_post(post.id).await.unwrap();
  assert_eq!(comments.len(), 1);
  assert_eq!(comments[0].author, "bob");
  assert_eq!(comments[0].comment.content, "Nice post!");
}

#[actix_rt::test]
async fn cannot_follow_yourself() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let app = init_app!(services);

  let req = test::TestRequest::post().uri("/users/alice/follow/")
    .cookie(session(&services, &alice))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp), "/users/alice/");
  assert_eq!(flashes(&services, &resp), vec!["You cannot follow yourself."]);

  assert!(!store.is_following(alice.id, alice.id).await.unwrap());
  let details = store.profile_details(alice.id).await.unwrap().unwrap();
  assert_eq!(details.followers_count, 0);
  assert_eq!(details.following_count, 0);
}

#[actix_rt::test]
async fn follow_toggles() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let bob = add_user(&store, "bob").await;
  let app = init_app!(services);

  let req = test::TestRequest::post().uri("/users/bob/follow/")
    .cookie(session(&services, &alice))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(flashes(&services, &resp), vec!["You followed bob."]);
  assert!(store.is_following(alice.id, bob.id).await.unwrap());
  // Following is one-way.
  assert!(!store.is_following(bob.id, alice.id).await.unwrap());

  let req = test::TestRequest::get().uri("/users/bob/")
    .cookie(session(&services, &alice))
    .to_request();
  let html = body_text(test::call_service(&app, req).await).await;
  assert!(html.contains("1 followers"));
  assert!(html.contains("Unfollow"));

  let req = test::TestRequest::post().uri("/users/bob/follow/")
    .cookie(session(&services, &alice))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(flashes(&services, &resp), vec!["You unfollowed bob."]);
  assert!(!store.is_following(alice.id, bob.id).await.unwrap());

  let req = test::TestRequest::post().uri("/users/nobody/follow/")
    .cookie(session(&services, &alice))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn profile_edit_updates_fields() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let app = init_app!(services);

  let req = test::TestRequest::post().uri("/profile/edit/")
    .cookie(session(&services, &alice))
    .set_form(&[("bio", "Hi there"), ("location", "Lisbon"), ("website", "not a url")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let req = test::TestRequest::post().uri("/profile/edit/")
    .cookie(session(&services, &alice))
    .set_form(&[("bio", "Hi there"), ("location", "Lisbon"), ("website", "https://alice.example")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp), "/users/alice/");
  assert_eq!(flashes(&services, &resp), vec!["Profile updated."]);

  let details = store.profile_details(alice.id).await.unwrap().unwrap();
  assert_eq!(details.profile.bio, "Hi there");
  assert_eq!(details.profile.location, "Lisbon");
  assert_eq!(details.profile.website, "https://alice.example");
}

#[actix_rt::test]
async fn deleting_account_cascades() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let bob = add_user(&store, "bob").await;
  let alice_post = add_post(&store, &alice, "Alice writes").await;
  let bob_post = add_post(&store, &bob, "Bob writes").await;
  store.create_comment(bob_post.id, alice.id, "from alice").await.unwrap();
  store.toggle_like(alice.id, bob_post.id).await.unwrap();
  store.toggle_follow(bob.id, alice.id).await.unwrap();
  let app = init_app!(services);

  let req = test::TestRequest::post().uri("/profile/delete/")
    .cookie(session(&services, &alice))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp), "/");
  assert_eq!(flash_list(&services, &resp), vec![Flash::info("Profile alice deleted.")]);
  let cleared = response_cookie(&resp, SESSION_COOKIE).unwrap();
  assert_eq!(cleared.value(), "");

  assert!(store.user_by_username("alice").await.unwrap().is_none());
  assert!(store.post_by_id(alice_post.id).await.unwrap().is_none());
  assert!(store.comments_for_post(bob_post.id).await.unwrap().is_empty());
  let summary = store.post_summary(None, bob_post.id).await.unwrap().unwrap();
  assert_eq!(summary.like_count, 0);
  let details = store.profile_details(bob.id).await.unwrap().unwrap();
  assert_eq!(details.following_count, 0);
}

#[actix_rt::test]
async fn register_then_login() {
  let services = load_services("");
  let store = memory(&services);
  let app = init_app!(services);

  let form = [
    ("username", "carol"),
    ("email", "carol@example.com"),
    ("password1", "s3cret-words"),
    ("password2", "s3cret-words"),
  ];
  let req = test::TestRequest::post().uri("/register/").set_form(&form).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(flashes(&services, &resp), vec!["Welcome! Your account has been created."]);
  let cookie = response_cookie(&resp, SESSION_COOKIE).unwrap();
  let auth = cookie.value().decode_jwt(services.keys()).unwrap();
  assert_eq!(auth.username, "carol");
  assert!(store.profile_details(auth.user_id).await.unwrap().is_some());

  // Same username again fails validation and creates nothing.
  let req = test::TestRequest::post().uri("/register/").set_form(&form).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert!(response_cookie(&resp, SESSION_COOKIE).is_none());
  assert!(body_text(resp).await.contains("A user with that username already exists."));
  let carol = store.user_by_username("carol").await.unwrap().unwrap();
  assert_eq!(carol.id, auth.user_id);
  assert_eq!(carol.email, "carol@example.com");

  let req = test::TestRequest::post().uri("/login/")
    .set_form(&[("username", "carol"), ("password", "wrong-password")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert!(body_text(resp).await.contains("Please enter a correct username and password."));

  let req = test::TestRequest::post().uri("/login/")
    .set_form(&[("username", "carol"), ("password", "s3cret-words")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(flashes(&services, &resp), vec!["Signed in successfully."]);
  assert!(response_cookie(&resp, SESSION_COOKIE).is_some());
}

#[actix_rt::test]
async fn logout_clears_session() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let app = init_app!(services);

  let req = test::TestRequest::post().uri("/logout/")
    .cookie(session(&services, &alice))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp), "/");
  assert_eq!(flashes(&services, &resp), vec!["You have been signed out."]);
  assert_eq!(response_cookie(&resp, SESSION_COOKIE).unwrap().value(), "");
}

#[actix_rt::test]
async fn flash_is_shown_once() {
  let services = load_services("");
  let app = init_app!(services);
  let keys = services.keys();
  let token = keys.encode_flash(&[Flash::success("Hello again.")]).unwrap();

  let req = test::TestRequest::get().uri("/")
    .cookie(keys.flash_cookie(token))
    .to_request();
  let resp = test::call_service(&app, req).await;
  let removal = response_cookie(&resp, FLASH_COOKIE).unwrap();
  assert_eq!(removal.value(), "");
  assert!(body_text(resp).await.contains("Hello again."));
}

#[actix_rt::test]
async fn registration_can_be_disabled() {
  let services = load_services("[User]\nallow_register = false\n");
  let app = init_app!(services);

  let req = test::TestRequest::get().uri("/register/").to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn deleted_account_cookie_is_signed_out() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let bob = add_user(&store, "bob").await;
  let post = add_post(&store, &alice, "Still here").await;
  let app = init_app!(services);
  // A second browser keeps bob's session.
  let other_device = session(&services, &bob);

  let req = test::TestRequest::post().uri("/profile/delete/")
    .cookie(session(&services, &bob))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::SEE_OTHER);

  let req = test::TestRequest::post().uri(&format!("/post/{}/comment/", post.id))
    .cookie(other_device.clone())
    .set_form(&[("content", "from beyond")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp), "/login/");

  let req = test::TestRequest::post().uri(&format!("/post/{}/like/", post.id))
    .cookie(other_device.clone())
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp), "/login/");

  let req = test::TestRequest::post().uri(&format!("/post/{}/", post.id))
    .cookie(other_device)
    .set_form(&[("content", "inline")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp), "/login/");

  assert!(store.comments_for_post(post.id).await.unwrap().is_empty());
  let summary = store.post_summary(None, post.id).await.unwrap().unwrap();
  assert_eq!(summary.like_count, 0);
}

#[actix_rt::test]
async fn bodyless_like_and_comment() {
  let services = load_services("");
  let store = memory(&services);
  let alice = add_user(&store, "alice").await;
  let bob = add_user(&store, "bob").await;
  let post = add_post(&store, &alice, "Plain forms").await;
  let app = init_app!(services);

  let req = test::TestRequest::post().uri(&format!("/post/{}/like/", post.id))
    .cookie(session(&services, &bob))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp), format!("/post/{}/", post.id));
  let summary = store.post_summary(Some(bob.id), post.id).await.unwrap().unwrap();
  assert_eq!(summary.like_count, 1);

  let req = test::TestRequest::post().uri(&format!("/post/{}/comment/", post.id))
    .cookie(session(&services, &bob))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(flash_list(&services, &resp),
    vec![Flash::error("Please correct the comment and try again.")]);
  assert!(store.comments_for_post(post.id).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn taken_username_shown_with_other_errors() {
  let services = load_services("");
  let store = memory(&services);
  add_user(&store, "dave").await;
  let app = init_app!(services);

  let req = test::TestRequest::post().uri("/register/")
    .set_form(&[("username", " dave "), ("password1", "1234567"), ("password2", "1234567")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let html = body_text(resp).await;
  assert!(html.contains("A user with that username already exists."));
  assert!(html.contains("too short"));
}
