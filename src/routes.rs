use std::time::Duration;

use axum::Router;
use axum::routing::{delete, get, post};
use db::ProfileRole;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::controllers::auth::logout_profile;
use crate::controllers::auth::sso::{sso_callback, sso_login};
use crate::controllers::blocked_email::{
	block_emails,
	check_blocked_email,
	get_blocked_emails,
	unblock_emails,
};
use crate::controllers::court::{
	create_court,
	delete_court,
	get_available_slots,
	get_court,
	get_courts,
	search_courts,
	update_court,
};
use crate::controllers::court_booking::{
	create_court_booking,
	delete_court_booking,
	get_booking_permission,
	get_court_booking,
	get_court_bookings,
	get_court_bookings_on_date,
	get_own_court_bookings,
	mark_court_booking_late,
	mark_overdue_court_bookings,
	punch_in_court_booking,
	punch_out_court_booking,
};
use crate::controllers::healthcheck;
use crate::controllers::profile::{
	assign_profile_society,
	get_current_navigation,
	get_current_profile,
	reset_profile_role,
	search_profiles,
	update_profile_role,
};
use crate::middleware::{AuthLayer, RoleLayer};

const ADMINS: &[ProfileRole] = &[ProfileRole::Admin];
const OPERATORS: &[ProfileRole] = &[ProfileRole::Manager, ProfileRole::Admin];

/// Get the app router
pub fn get_app_router(state: AppState) -> Router {
	let api_routes = Router::new()
		.route("/healthcheck", get(healthcheck))
		.nest("/auth", auth_routes(&state))
		.nest("/profiles", profile_routes(&state))
		.nest("/courts", court_routes(&state))
		.nest("/court-bookings", court_booking_routes(&state))
		.nest("/blocked-emails", blocked_email_routes(&state));

	Router::new()
		.merge(api_routes)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(10)))
				.layer(CompressionLayer::new()),
		)
		.with_state(state)
}

/// Authentication routes
fn auth_routes(state: &AppState) -> Router<AppState> {
	Router::new()
		.route("/sso/callback", get(sso_callback))
		.route("/sso/{provider}", get(sso_login))
		.route(
			"/logout",
			post(logout_profile).route_layer(AuthLayer::new(state.clone())),
		)
}

/// Profile routes, role administration is restricted to admins
fn profile_routes(state: &AppState) -> Router<AppState> {
	let protected = Router::new()
		.route("/", get(search_profiles))
		.route(
			"/{id}/role",
			post(update_profile_role).delete(reset_profile_role),
		)
		.route("/{id}/society", post(assign_profile_society))
		.route_layer(RoleLayer::new(state.clone(), ADMINS));

	Router::new()
		.route("/me", get(get_current_profile))
		.route("/me/navigation", get(get_current_navigation))
		.merge(protected)
		.route_layer(AuthLayer::new(state.clone()))
}

/// Court routes, anyone can browse courts but only admins manage them
fn court_routes(state: &AppState) -> Router<AppState> {
	let managed = Router::new()
		.route("/", post(create_court))
		.route("/{id}", post(update_court).delete(delete_court))
		.route_layer(RoleLayer::new(state.clone(), ADMINS))
		.route_layer(AuthLayer::new(state.clone()));

	let operated = Router::new()
		.route("/{id}/bookings", get(get_court_bookings_on_date))
		.route_layer(RoleLayer::new(state.clone(), OPERATORS))
		.route_layer(AuthLayer::new(state.clone()));

	Router::new()
		.route("/", get(get_courts))
		.route("/search", get(search_courts))
		.route("/{id}", get(get_court))
		.route("/{id}/slots", get(get_available_slots))
		.merge(managed)
		.merge(operated)
}

/// Court booking routes, status changes are restricted to operators
fn court_booking_routes(state: &AppState) -> Router<AppState> {
	let operated = Router::new()
		.route("/", get(get_court_bookings))
		.route("/mark-late", post(mark_overdue_court_bookings))
		.route("/{id}/punch-in", post(punch_in_court_booking))
		.route("/{id}/punch-out", post(punch_out_court_booking))
		.route("/{id}/mark-late", post(mark_court_booking_late))
		.route("/{id}", delete(delete_court_booking))
		.route_layer(RoleLayer::new(state.clone(), OPERATORS));

	Router::new()
		.route("/", post(create_court_booking))
		.route("/me", get(get_own_court_bookings))
		.route("/permission", get(get_booking_permission))
		.route("/{id}", get(get_court_booking))
		.merge(operated)
		.route_layer(AuthLayer::new(state.clone()))
}

/// Blocked email routes, managing blocks is restricted to operators
fn blocked_email_routes(state: &AppState) -> Router<AppState> {
	let operated = Router::new()
		.route("/", get(get_blocked_emails).post(block_emails))
		.route("/unblock", post(unblock_emails))
		.route_layer(RoleLayer::new(state.clone(), OPERATORS));

	Router::new()
		.route("/check", get(check_blocked_email))
		.merge(operated)
		.route_layer(AuthLayer::new(state.clone()))
}
