use crate::{
    diff::{Direction, Transition},
    subscribers::SubscriberRegistry,
};
use std::collections::BTreeSet;
use valwatch_common::Alert;

/// Renders the alert for `transition` and mentions everyone following the validator.
pub fn build_alert(
    operator_address: &str,
    moniker: &str,
    transition: &Transition,
    registry: &dyn SubscriberRegistry,
) -> Alert {
    let subscribers = registry.resolve_subscribers(&operator_address.to_lowercase());
    let body = render_text(moniker, transition);
    let text = compose_text(&body, &subscribers, MentionStyle::Angle);

    Alert {
        category: transition.category(),
        operator_address: operator_address.to_owned(),
        body,
        subscribers,
        text,
        is_critical: is_critical(transition),
    }
}

pub fn render_text(moniker: &str, transition: &Transition) -> String {
    match transition {
        Transition::NewValidator => format!("🆕 New validator {moniker} has joined the network."),
        Transition::Commission { old, new } => format!(
            "⚠️ {moniker} has changed commission from {:.2}% to {:.2}%.",
            old * 100.0,
            new * 100.0
        ),
        Transition::Uptime(crossing) => match crossing.direction {
            Direction::Rising => format!(
                "🟢 {moniker} uptime has risen above {}%: now at {}%.",
                crossing.threshold, crossing.current
            ),
            Direction::Falling => format!(
                "⚠️ {moniker} uptime has dropped below {}%: now at {}%.",
                crossing.threshold, crossing.current
            ),
        },
        Transition::Active => format!("🟢 {moniker} is now active."),
        Transition::Jailed => format!("🔴 {moniker} has been jailed."),
        Transition::InactiveInsufficient => {
            format!("🔴 {moniker} is now inactive due to insufficient tokens.")
        }
        Transition::InactiveJailed => format!("🔴 {moniker} is now inactive and jailed."),
        Transition::UnjailedActive => format!("🟢 {moniker} has been unjailed and is now active."),
        Transition::UnjailedInactive => {
            format!("⚠️ {moniker} has been unjailed but is still inactive.")
        }
    }
}

/// Critical alerts are the ones that need an operator to act.
pub fn is_critical(transition: &Transition) -> bool {
    match transition {
        Transition::Commission { .. }
        | Transition::Jailed
        | Transition::InactiveInsufficient
        | Transition::InactiveJailed
        | Transition::UnjailedInactive => true,
        Transition::Uptime(crossing) => crossing.direction == Direction::Falling,
        Transition::NewValidator | Transition::Active | Transition::UnjailedActive => false,
    }
}

/// How a delivery channel addresses a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionStyle {
    /// `<@id>`, the form carried in [`Alert::text`].
    Angle,
    /// `@handle`, which Telegram links to the user in plain-text messages.
    Handle,
}

impl MentionStyle {
    pub fn mention(self, id: &str) -> String {
        match self {
            MentionStyle::Angle => format!("<@{id}>"),
            MentionStyle::Handle => format!("@{}", id.trim_start_matches('@')),
        }
    }
}

/// Mentions separated by single spaces, in subscriber id order.
pub fn format_mentions(subscribers: &BTreeSet<String>, style: MentionStyle) -> String {
    subscribers
        .iter()
        .map(|id| style.mention(id))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `body`, then a space and the mentions when anyone follows the validator.
pub fn compose_text(body: &str, subscribers: &BTreeSet<String>, style: MentionStyle) -> String {
    if subscribers.is_empty() {
        return body.to_owned();
    }
    format!("{body} {}", format_mentions(subscribers, style))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{diff::UptimeCrossing, subscribers::StaticSubscriberRegistry};
    use valwatch_common::AlertCategory;

    fn falling(threshold: u8, current: f64) -> Transition {
        Transition::Uptime(UptimeCrossing {
            threshold,
            direction: Direction::Falling,
            current,
        })
    }

    #[test]
    fn renders_uptime_drop_with_whole_percentages() {
        let alert = build_alert(
            "storyvaloper1a",
            "Alpha",
            &falling(95, 93.0),
            &StaticSubscriberRegistry::new(),
        );

        assert_eq!(alert.text, "⚠️ Alpha uptime has dropped below 95%: now at 93%.");
        assert_eq!(alert.category, AlertCategory::Uptime);
        assert!(alert.is_critical);
    }

    #[test]
    fn renders_commission_with_two_decimals() {
        let text = render_text("Alpha", &Transition::Commission { old: 0.05, new: 0.125 });
        assert_eq!(text, "⚠️ Alpha has changed commission from 5.00% to 12.50%.");
    }

    #[test]
    fn rising_uptime_keeps_fractional_value() {
        let transition = Transition::Uptime(UptimeCrossing {
            threshold: 90,
            direction: Direction::Rising,
            current: 91.25,
        });
        assert_eq!(
            render_text("Beta", &transition),
            "🟢 Beta uptime has risen above 90%: now at 91.25%."
        );
        assert!(!is_critical(&transition));
    }

    #[test]
    fn appends_mentions_for_followers() {
        let mut registry = StaticSubscriberRegistry::new();
        registry.follow("42", "storyvaloper1a");
        registry.follow("7", "STORYVALOPER1A");

        let alert = build_alert("StoryValoper1A", "Alpha", &Transition::Jailed, &registry);

        assert_eq!(alert.text, "🔴 Alpha has been jailed. <@42> <@7>");
        assert_eq!(alert.body, "🔴 Alpha has been jailed.");
        assert_eq!(alert.operator_address, "StoryValoper1A");
    }

    #[test]
    fn handle_mentions_do_not_double_the_at_sign() {
        let subscribers = BTreeSet::from(["@alice".to_owned(), "bob".to_owned()]);

        assert_eq!(
            compose_text("🔴 Alpha has been jailed.", &subscribers, MentionStyle::Handle),
            "🔴 Alpha has been jailed. @alice @bob"
        );
        assert_eq!(
            compose_text("🔴 Alpha has been jailed.", &BTreeSet::new(), MentionStyle::Handle),
            "🔴 Alpha has been jailed."
        );
    }

    #[test]
    fn severity_follows_category() {
        assert!(is_critical(&Transition::InactiveJailed));
        assert!(is_critical(&Transition::UnjailedInactive));
        assert!(!is_critical(&Transition::Active));
        assert!(!is_critical(&Transition::UnjailedActive));
        assert!(!is_critical(&Transition::NewValidator));
    }
}
