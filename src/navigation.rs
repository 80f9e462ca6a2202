//! Role and host dependent navigation handed to the frontend

use db::ProfileRole;
use serde::Serialize;

const INVENTORY_HOST_MARKER: &str = "inventory-iitbbs";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavLink {
	pub label: &'static str,
	pub href:  &'static str,
}

/// Everything the frontend needs to render its navigation bar
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
	pub brand_name:   &'static str,
	pub logo:         &'static str,
	pub role:         ProfileRole,
	pub links:        Vec<NavLink>,
	pub assign_roles: bool,
}

impl Navigation {
	/// Resolve the navigation for a role, as served on a given host
	#[must_use]
	pub fn resolve(role: ProfileRole, host: Option<&str>) -> Self {
		let (brand_name, logo) = match host {
			Some(h) if h.contains(INVENTORY_HOST_MARKER) => {
				("Inventory Gymkhana", "/gymkhana.png")
			},
			_ => ("Vault IITBBS", "/iitlogo.png"),
		};

		let inventory = match role {
			ProfileRole::Society => {
				NavLink { label: "Inventory List", href: "/inventory-check" }
			},
			ProfileRole::Manager => {
				NavLink { label: "All Bookings", href: "/manager-list" }
			},
			ProfileRole::Admin => {
				NavLink { label: "Inventory List", href: "/inventory-admin" }
			},
			_ => NavLink { label: "Reserve", href: "/inventory" },
		};

		let requests = match role {
			ProfileRole::Society => {
				NavLink { label: "Item Requests", href: "/items-requests" }
			},
			ProfileRole::Manager => {
				NavLink { label: "Issue", href: "/manager-portal" }
			},
			ProfileRole::Admin => {
				NavLink { label: "All Bookings", href: "/requests-admin" }
			},
			_ => NavLink { label: "My Bookings", href: "/requests" },
		};

		let mut links =
			vec![NavLink { label: "Home", href: "/" }, inventory, requests];

		let assign_roles = role == ProfileRole::Admin;

		if assign_roles {
			links.extend([
				NavLink { label: "Add Item", href: "/add-item" },
				NavLink { label: "Assign Roles", href: "/assign-role" },
				NavLink { label: "Block Users", href: "/block" },
				NavLink { label: "Unblock Users", href: "/block/unblock" },
			]);
		}

		Self { brand_name, logo, role, links, assign_roles }
	}
}
