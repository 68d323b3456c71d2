// src/services/placement.rs
// Resolves which promotions are eligible for a placement slot.
//
// Selection policy: the resolved list is ordered priority DESC then
// created_at DESC; a single-slot pick is drawn uniformly at random from
// the tied top-priority candidates.

use crate::models::ads::{AdPlacement, BrandPromotion, PlacementType};
use crate::services::PromotionService;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use sqlx::PgPool;
use uuid::Uuid;

/// Where the viewer currently is. All fields optional; an absent field
/// matches only untargeted rules on that dimension.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementContext {
    pub video_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
}

pub struct PlacementResolver;

impl PlacementResolver {
    /// Active+approved promotions eligible for `placement_type` in the
    /// given context, ordered by priority DESC then created_at DESC.
    ///
    /// A promotion with no placement rules for the type is eligible
    /// everywhere (the guaranteed minimal behavior); one with rules is
    /// eligible only where at least one rule matches.
    pub async fn resolve_active(
        pool: &PgPool,
        placement_type: PlacementType,
        context: &PlacementContext,
    ) -> Result<Vec<BrandPromotion>, sqlx::Error> {
        let promotions = PromotionService::list_active(pool).await?;
        let rules = sqlx::query_as::<_, AdPlacement>(
            "SELECT * FROM brand_ad_placements
             WHERE placement_type = $1 AND is_active = true",
        )
        .bind(placement_type.as_str())
        .fetch_all(pool)
        .await?;

        Ok(filter_eligible(promotions, &rules, context, Utc::now()))
    }

    /// List the placement rules attached to one promotion (admin view).
    pub async fn list_for_promotion(
        pool: &PgPool,
        promotion_id: Uuid,
    ) -> Result<Vec<AdPlacement>, sqlx::Error> {
        sqlx::query_as::<_, AdPlacement>(
            "SELECT * FROM brand_ad_placements
             WHERE promotion_id = $1
             ORDER BY created_at DESC",
        )
        .bind(promotion_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create_rule(
        pool: &PgPool,
        promotion_id: Uuid,
        placement_type: PlacementType,
        rule: crate::models::ads::NewAdPlacement,
    ) -> Result<AdPlacement, sqlx::Error> {
        sqlx::query_as::<_, AdPlacement>(
            r#"
            INSERT INTO brand_ad_placements (
                promotion_id, placement_type, target_videos, target_subjects,
                target_batches, show_frequency, max_daily_shows,
                start_date, end_date, is_active
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(promotion_id)
        .bind(placement_type.as_str())
        .bind(&rule.target_videos)
        .bind(&rule.target_subjects)
        .bind(&rule.target_batches)
        .bind(rule.show_frequency.unwrap_or(3))
        .bind(rule.max_daily_shows.unwrap_or(50))
        .bind(rule.start_date)
        .bind(rule.end_date)
        .bind(rule.is_active.unwrap_or(true))
        .fetch_one(pool)
        .await
    }
}

/// Pure eligibility pass. The output is always ordered priority DESC,
/// created_at DESC, regardless of input order.
pub fn filter_eligible(
    promotions: Vec<BrandPromotion>,
    rules: &[AdPlacement],
    context: &PlacementContext,
    now: DateTime<Utc>,
) -> Vec<BrandPromotion> {
    let mut eligible: Vec<BrandPromotion> = promotions
        .into_iter()
        .filter(|promotion| {
            let own_rules: Vec<&AdPlacement> = rules
                .iter()
                .filter(|r| r.promotion_id == promotion.id)
                .collect();
            own_rules.is_empty() || own_rules.iter().any(|r| rule_matches(r, context, now))
        })
        .collect();
    eligible.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(b.created_at.cmp(&a.created_at))
    });
    eligible
}

fn rule_matches(rule: &AdPlacement, context: &PlacementContext, now: DateTime<Utc>) -> bool {
    if !rule.is_active {
        return false;
    }
    if let Some(start) = rule.start_date {
        if now < start {
            return false;
        }
    }
    if let Some(end) = rule.end_date {
        if now > end {
            return false;
        }
    }
    targets_match(&rule.target_videos, context.video_id)
        && targets_match(&rule.target_subjects, context.subject_id)
        && targets_match(&rule.target_batches, context.batch_id)
}

/// An absent or empty target list is a wildcard; a populated list requires
/// the context to carry a matching id.
fn targets_match(targets: &Option<Vec<Uuid>>, context_id: Option<Uuid>) -> bool {
    match targets {
        None => true,
        Some(list) if list.is_empty() => true,
        Some(list) => context_id.map_or(false, |id| list.contains(&id)),
    }
}

/// Single-slot pick: uniform random among the tied top-priority
/// candidates of an already ordered eligible list.
pub fn select_single(candidates: &[BrandPromotion]) -> Option<&BrandPromotion> {
    let top_priority = candidates.first()?.priority;
    let top: Vec<&BrandPromotion> = candidates
        .iter()
        .take_while(|p| p.priority == top_priority)
        .collect();
    top.choose(&mut rand::thread_rng()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn promotion(priority: i32, age_days: i64) -> BrandPromotion {
        let created = Utc::now() - Duration::days(age_days);
        BrandPromotion {
            id: Uuid::new_v4(),
            brand_name: "Acme".to_string(),
            brand_logo: None,
            contact_email: "ads@acme.test".to_string(),
            contact_phone: None,
            product_name: "Widget".to_string(),
            product_description: None,
            target_audience: None,
            campaign_budget: None,
            campaign_duration_days: 30,
            video_url: None,
            website_url: None,
            call_to_action: "Learn More".to_string(),
            is_active: true,
            is_approved: true,
            priority,
            impressions: 0,
            clicks: 0,
            created_at: created,
            updated_at: created,
        }
    }

    fn rule_for(promotion_id: Uuid) -> AdPlacement {
        AdPlacement {
            id: Uuid::new_v4(),
            promotion_id,
            placement_type: "banner".to_string(),
            target_videos: None,
            target_subjects: None,
            target_batches: None,
            show_frequency: 3,
            max_daily_shows: 50,
            start_date: None,
            end_date: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_promotions_without_rules_are_eligible_everywhere() {
        let promotions = vec![promotion(5, 1), promotion(2, 1)];
        let eligible = filter_eligible(promotions, &[], &PlacementContext::default(), Utc::now());
        assert_eq!(eligible.len(), 2);
        assert_eq!(eligible[0].priority, 5);
    }

    #[test]
    fn test_target_list_restricts_to_matching_context() {
        let p = promotion(3, 1);
        let video = Uuid::new_v4();
        let mut rule = rule_for(p.id);
        rule.target_videos = Some(vec![video]);

        let rules = vec![rule];
        let off_target = PlacementContext {
            video_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let on_target = PlacementContext {
            video_id: Some(video),
            ..Default::default()
        };
        let no_context = PlacementContext::default();

        assert!(filter_eligible(vec![p.clone()], &rules, &off_target, Utc::now()).is_empty());
        assert!(filter_eligible(vec![p.clone()], &rules, &no_context, Utc::now()).is_empty());
        assert_eq!(filter_eligible(vec![p], &rules, &on_target, Utc::now()).len(), 1);
    }

    #[test]
    fn test_empty_target_list_is_wildcard() {
        let p = promotion(3, 1);
        let mut rule = rule_for(p.id);
        rule.target_videos = Some(vec![]);
        let eligible = filter_eligible(
            vec![p],
            &[rule],
            &PlacementContext::default(),
            Utc::now(),
        );
        assert_eq!(eligible.len(), 1);
    }

    #[test]
    fn test_schedule_window_excludes_outside_dates() {
        let p = promotion(3, 1);
        let mut rule = rule_for(p.id);
        rule.start_date = Some(Utc::now() + Duration::days(1));
        assert!(filter_eligible(
            vec![p.clone()],
            &[rule.clone()],
            &PlacementContext::default(),
            Utc::now()
        )
        .is_empty());

        rule.start_date = Some(Utc::now() - Duration::days(2));
        rule.end_date = Some(Utc::now() - Duration::days(1));
        assert!(filter_eligible(
            vec![p.clone()],
            &[rule.clone()],
            &PlacementContext::default(),
            Utc::now()
        )
        .is_empty());

        rule.end_date = Some(Utc::now() + Duration::days(1));
        assert_eq!(
            filter_eligible(vec![p], &[rule], &PlacementContext::default(), Utc::now()).len(),
            1
        );
    }

    #[test]
    fn test_inactive_rule_never_matches() {
        let p = promotion(3, 1);
        let mut rule = rule_for(p.id);
        rule.is_active = false;
        assert!(filter_eligible(
            vec![p],
            &[rule],
            &PlacementContext::default(),
            Utc::now()
        )
        .is_empty());
    }

    #[test]
    fn test_any_matching_rule_suffices() {
        let p = promotion(3, 1);
        let mut narrow = rule_for(p.id);
        narrow.target_videos = Some(vec![Uuid::new_v4()]);
        let broad = rule_for(p.id);

        let eligible = filter_eligible(
            vec![p],
            &[narrow, broad],
            &PlacementContext::default(),
            Utc::now(),
        );
        assert_eq!(eligible.len(), 1);
    }

    #[test]
    fn test_ordering_priority_desc_then_recency() {
        let old_top = promotion(5, 10);
        let new_top = promotion(5, 1);
        let low = promotion(2, 0);
        // Deliberately shuffled input.
        let eligible = filter_eligible(
            vec![low.clone(), old_top.clone(), new_top.clone()],
            &[],
            &PlacementContext::default(),
            Utc::now(),
        );
        let ids: Vec<Uuid> = eligible.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![new_top.id, old_top.id, low.id]);
    }

    #[test]
    fn test_select_single_picks_from_top_priority_tier() {
        let top_a = promotion(5, 1);
        let top_b = promotion(5, 2);
        let low = promotion(2, 1);
        let candidates = vec![top_a.clone(), top_b.clone(), low.clone()];

        for _ in 0..50 {
            let picked = select_single(&candidates).expect("non-empty candidates");
            assert_eq!(picked.priority, 5);
            assert_ne!(picked.id, low.id);
        }
    }

    #[test]
    fn test_select_single_empty_is_none() {
        assert!(select_single(&[]).is_none());
    }
}
