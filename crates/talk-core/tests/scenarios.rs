//! End-to-end deliberation scenarios against the in-memory store.

use talk_core::{GroupDraft, HistoryQuery, IdeaDraft, TalkError, TalkService};
use talk_types::{
    parse_tag_list, AccessLevel, Actor, GroupPatch, IdeaStatus, Role, UserId,
};

const F: Actor = Actor::User(UserId(1));
const M1: Actor = Actor::User(UserId(2));
const M2: Actor = Actor::User(UserId(3));
const O: Actor = Actor::User(UserId(4));

#[tokio::test]
async fn lifecycle_scenario() {
    let talk = TalkService::in_memory();

    let mut draft = GroupDraft::new("Harness Deliberation");
    draft.description = "Test group for automated harness".into();
    draft.tags = parse_tag_list("test, harness, automated");
    let group = talk.groups().create_group(F, draft).await.unwrap();
    assert_eq!(group.tags, vec!["test", "harness", "automated"]);

    for actor in [M1, M2, O] {
        talk.groups().join_group(actor, group.id).await.unwrap();
    }
    talk.groups()
        .update_member(F, group.id, UserId(4), Role::Observer)
        .await
        .unwrap();

    let f_idea = talk
        .ideas()
        .save(F, IdeaDraft::new(group.id, "Facilitator idea"))
        .await
        .unwrap();
    let m1_idea = talk
        .ideas()
        .save(M1, IdeaDraft::new(group.id, "Member one idea"))
        .await
        .unwrap();
    let m2_idea = talk
        .ideas()
        .save(M2, IdeaDraft::new(group.id, "Member two idea"))
        .await
        .unwrap();
    assert!(matches!(
        talk.ideas().save(O, IdeaDraft::new(group.id, "Observer idea")).await,
        Err(TalkError::Authorization(_))
    ));

    let history = talk
        .views()
        .history(F, HistoryQuery::for_group(group.id))
        .await
        .unwrap();
    assert_eq!(history.len(), 3);

    talk.ideas()
        .edit(M1, m1_idea.id, "Member one idea, edited")
        .await
        .unwrap();
    assert!(matches!(
        talk.ideas().edit(M2, f_idea.id, "hijack").await,
        Err(TalkError::Authorization(_))
    ));

    talk.ideas()
        .promote(F, f_idea.id, IdeaStatus::Refining)
        .await
        .unwrap();
    talk.ideas()
        .promote(M1, m1_idea.id, IdeaStatus::Refining)
        .await
        .unwrap();
    talk.ideas()
        .toggle_shareable(F, f_idea.id, Some(true))
        .await
        .unwrap();

    assert!(matches!(
        talk.ideas().delete(M1, m2_idea.id).await,
        Err(TalkError::Authorization(_))
    ));
    talk.ideas().delete(M2, m2_idea.id).await.unwrap();

    talk.groups()
        .update_group(
            F,
            group.id,
            GroupPatch {
                description: Some("Updated by harness".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(matches!(
        talk.groups()
            .update_group(
                M1,
                group.id,
                GroupPatch {
                    description: Some("nope".into()),
                    ..Default::default()
                },
            )
            .await,
        Err(TalkError::Authorization(_))
    ));

    let detail = talk.views().get_group(F, group.id).await.unwrap();
    assert_eq!(detail.group.member_count, 4);
    assert_eq!(detail.group.group.description, "Updated by harness");
    assert_eq!(detail.ideas.len(), 1);
    assert_eq!(detail.user_role, Some(Role::Facilitator));

    talk.groups().leave_group(M1, group.id).await.unwrap();
    assert!(matches!(
        talk.ideas().save(M1, IdeaDraft::new(group.id, "after leaving")).await,
        Err(TalkError::Authorization(_))
    ));

    let mine = talk.views().list_groups(F, true).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].member_count, 3);
}

#[tokio::test]
async fn access_scenario() {
    let talk = TalkService::in_memory();

    let mut closed = GroupDraft::new("Observer Group");
    closed.access_level = AccessLevel::Closed;
    let obs_group = talk.groups().create_group(O, closed).await.unwrap();
    assert!(matches!(
        talk.ideas().save(M1, IdeaDraft::new(obs_group.id, "not a member")).await,
        Err(TalkError::Authorization(_))
    ));

    let group = talk
        .groups()
        .create_group(F, GroupDraft::new("Access Test Group"))
        .await
        .unwrap();
    talk.groups().join_group(M1, group.id).await.unwrap();
    talk.groups().join_group(M2, group.id).await.unwrap();

    assert!(matches!(
        talk.groups()
            .update_member(M1, group.id, UserId(3), Role::Observer)
            .await,
        Err(TalkError::Authorization(_))
    ));
    talk.groups()
        .update_member(F, group.id, UserId(3), Role::Facilitator)
        .await
        .unwrap();
    talk.groups()
        .update_group(
            M2,
            group.id,
            GroupPatch {
                description: Some("Updated by new facilitator".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        talk.groups().join_group(O, obs_group.id).await,
        Err(TalkError::Conflict(_))
    ));
    assert!(matches!(
        talk.groups().join_group(M1, obs_group.id).await,
        Err(TalkError::Authorization(_))
    ));
}

#[tokio::test]
async fn links_scenario() {
    let talk = TalkService::in_memory();
    let group = talk
        .groups()
        .create_group(F, GroupDraft::new("Links Test"))
        .await
        .unwrap();
    let a = talk
        .ideas()
        .save(F, IdeaDraft::new(group.id, "Link test idea A"))
        .await
        .unwrap();
    let b = talk
        .ideas()
        .save(F, IdeaDraft::new(group.id, "Link test idea B"))
        .await
        .unwrap();

    talk.links()
        .create_link(F, a.id, b.id, Some("related"))
        .await
        .unwrap();
    assert_eq!(talk.links().get_links(F, a.id).await.unwrap().len(), 1);
    assert!(matches!(
        talk.links().create_link(F, a.id, a.id, Some("related")).await,
        Err(TalkError::Validation(_))
    ));
    assert!(matches!(
        talk.links().create_link(F, a.id, b.id, Some("related")).await,
        Err(TalkError::Conflict(_))
    ));
    assert!(matches!(
        talk.links().create_link(F, b.id, a.id, Some("related")).await,
        Err(TalkError::Conflict(_))
    ));

    let history = talk
        .views()
        .history(F, HistoryQuery::for_group(group.id))
        .await
        .unwrap();
    assert!(history.iter().all(|view| view.link_count == 1));
}

#[tokio::test]
async fn edge_scenario() {
    let talk = TalkService::in_memory();
    let group = talk
        .groups()
        .create_group(F, GroupDraft::new("Edge Cases"))
        .await
        .unwrap();
    talk.groups().join_group(M1, group.id).await.unwrap();

    assert!(matches!(
        talk.ideas().save(F, IdeaDraft::new(group.id, "")).await,
        Err(TalkError::Validation(_))
    ));
    assert!(matches!(
        talk.groups().join_group(M1, group.id).await,
        Err(TalkError::Conflict(_))
    ));

    let tmp = talk
        .ideas()
        .save(F, IdeaDraft::new(group.id, "Delete me twice"))
        .await
        .unwrap();
    talk.ideas().delete(F, tmp.id).await.unwrap();
    assert!(matches!(
        talk.ideas().delete(F, tmp.id).await,
        Err(TalkError::NotFound(_))
    ));
    assert!(matches!(
        talk.ideas().edit(F, tmp.id, "Edit after delete").await,
        Err(TalkError::NotFound(_))
    ));

    assert!(matches!(
        talk.ideas()
            .save(Actor::Anonymous, IdeaDraft::new(group.id, "No auth"))
            .await,
        Err(TalkError::Authentication(_))
    ));
}

#[tokio::test]
async fn wifi_example() {
    let talk = TalkService::in_memory();
    let g = talk
        .groups()
        .create_group(F, GroupDraft::new("G"))
        .await
        .unwrap();
    talk.groups().join_group(M1, g.id).await.unwrap();
    talk.groups().join_group(M2, g.id).await.unwrap();

    talk.ideas()
        .save(M1, IdeaDraft::new(g.id, "WiFi upgrades"))
        .await
        .unwrap();
    let f_idea = talk
        .ideas()
        .save(F, IdeaDraft::new(g.id, "Facilitator notes"))
        .await
        .unwrap();
    assert!(matches!(
        talk.ideas().edit(M2, f_idea.id, "mine now").await,
        Err(TalkError::Authorization(_))
    ));

    let own = talk
        .ideas()
        .save(M2, IdeaDraft::new(g.id, "Temporary"))
        .await
        .unwrap();
    talk.ideas().delete(M2, own.id).await.unwrap();
    assert!(matches!(
        talk.ideas().delete(M2, own.id).await,
        Err(TalkError::NotFound(_))
    ));

    talk.groups().leave_group(M1, g.id).await.unwrap();
    assert!(talk
        .ideas()
        .save(M1, IdeaDraft::new(g.id, "Back again"))
        .await
        .is_err());
}

#[tokio::test]
async fn delete_group_cascades_to_ideas() {
    let talk = TalkService::in_memory();
    let group = talk
        .groups()
        .create_group(F, GroupDraft::new("Short lived"))
        .await
        .unwrap();
    talk.groups().join_group(M1, group.id).await.unwrap();
    let idea = talk
        .ideas()
        .save(M1, IdeaDraft::new(group.id, "Gone with the group"))
        .await
        .unwrap();

    assert!(matches!(
        talk.groups().delete_group(M1, group.id).await,
        Err(TalkError::Authorization(_))
    ));
    talk.groups().delete_group(F, group.id).await.unwrap();

    assert!(matches!(
        talk.views().get_group(F, group.id).await,
        Err(TalkError::NotFound(_))
    ));
    assert!(matches!(
        talk.ideas().edit(M1, idea.id, "still here?").await,
        Err(TalkError::NotFound(_))
    ));
    assert!(talk.views().list_groups(M1, true).await.unwrap().is_empty());
}
