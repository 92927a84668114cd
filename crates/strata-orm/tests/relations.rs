//! Relation population against a recording mock driver.

mod common;
use common::*;

use serde_json::{json, Value};
use strata_orm::prelude::*;
use strata_orm::{Entity, Model, Orm, OrmError, OrmOptions, RelationValue, SqlValue};

fn orm(driver: &MockDriver) -> Orm {
    Orm::new(driver.clone(), blog_registry())
}

fn many<'m>(model: &'m dyn Model, relation: &str) -> &'m [Box<dyn Model>] {
    model
        .relations()
        .many(relation)
        .unwrap_or_else(|| panic!("relation {relation} was not populated"))
}

#[tokio::test]
async fn test_belongs_to_is_joined_and_nested() {
    let driver = MockDriver::new();
    driver.on(
        "FROM \"posts\"",
        vec![
            json!({
                "id": 1, "user_id": 5, "title": "a",
                "$author$.id": 5, "$author$.name": "ann", "$author$.company_id": null,
            }),
            json!({
                "id": 2, "user_id": null, "title": "b",
                "$author$.id": null, "$author$.name": null, "$author$.company_id": null,
            }),
        ],
    );
    let orm = orm(&driver);

    let mut query = orm.query("Post").unwrap();
    query.populate("author").unwrap();
    let posts = query.execute(&orm).await.unwrap().into_vec();

    assert_eq!(
        driver.expressions(),
        vec![
            "SELECT \"$Source$\".*, \"$author$\".\"id\" AS \"$author$.id\", \
             \"$author$\".\"name\" AS \"$author$.name\", \
             \"$author$\".\"company_id\" AS \"$author$.company_id\" \
             FROM \"posts\" AS \"$Source$\" \
             LEFT JOIN \"users\" AS \"$author$\" ON \"$author$\".\"id\" = \"$Source$\".\"user_id\""
        ]
    );
    assert_eq!(
        posts[0].to_json(),
        json!({
            "id": 1, "user_id": 5, "title": "a",
            "author": {"id": 5, "name": "ann", "company_id": null},
        })
    );
    // A LEFT JOIN miss leaves the relation empty.
    assert_eq!(posts[1].to_json()["author"], Value::Null);
    assert!(posts[1].relations().contains("author"));
}

#[tokio::test]
async fn test_nested_belongs_to_chain() {
    let driver = MockDriver::new();
    driver.on(
        "FROM \"posts\"",
        vec![json!({
            "id": 1, "user_id": 5, "title": "a",
            "$author$.id": 5, "$author$.name": "ann", "$author$.company_id": 3,
            "$author$.$company$.id": 3, "$author$.$company$.name": "acme",
        })],
    );
    let orm = orm(&driver);

    let mut query = orm.query("Post").unwrap();
    query
        .populate_with("author", |author| {
            author.populate("company")?;
            Ok(())
        })
        .unwrap();
    let post = query.execute(&orm).await.unwrap().into_vec().remove(0);

    let expression = &driver.expressions()[0];
    assert!(expression.ends_with(
        "LEFT JOIN \"users\" AS \"$author$\" ON \"$author$\".\"id\" = \"$Source$\".\"user_id\" \
         LEFT JOIN \"companies\" AS \"$author$.$company$\" \
         ON \"$author$.$company$\".\"id\" = \"$author$\".\"company_id\""
    ));
    assert!(expression.contains("\"$author$.$company$\".\"name\" AS \"$author$.$company$.name\""));

    let company = post
        .relations()
        .one("author")
        .and_then(|author| author.relations().one("company"))
        .unwrap();
    assert_eq!(company.get("name"), Some(json!("acme")));
    assert_eq!(company.model_name(), "Company");
}

#[tokio::test]
async fn test_one_to_many_groups_by_foreign_key() {
    let driver = MockDriver::new();
    driver
        .on("FROM \"users\"", vec![json!({"id": 1}), json!({"id": 2})])
        .on(
            "FROM \"posts\"",
            vec![
                json!({"id": 10, "user_id": 1}),
                json!({"id": 11, "user_id": 1}),
            ],
        );
    let orm = orm(&driver);

    let mut query = orm.query("User").unwrap();
    query.populate("posts").unwrap();
    let users = query.execute(&orm).await.unwrap().into_vec();

    let posts_query = driver.find("FROM \"posts\"");
    assert_eq!(
        posts_query.expression,
        "SELECT \"$posts$\".* FROM \"posts\" AS \"$posts$\" WHERE \"$posts$\".\"user_id\" IN (?, ?)"
    );
    assert_eq!(posts_query.bindings, vec![SqlValue::Int(1), SqlValue::Int(2)]);

    assert_eq!(
        field_values(many(users[0].as_ref(), "posts"), "id"),
        vec![json!(10), json!(11)]
    );
    assert!(many(users[1].as_ref(), "posts").is_empty());
}

#[tokio::test]
async fn test_one_to_many_keeps_relation_filters() {
    let driver = MockDriver::new();
    driver.on("FROM \"users\"", vec![json!({"id": 1})]);
    let orm = orm(&driver);

    let mut query = orm.query("User").unwrap();
    query
        .populate_with("posts", |posts| {
            posts.select("title")?.where_("title", "a")?.or_where(("title", "b"))?;
            Ok(())
        })
        .unwrap();
    query.execute(&orm).await.unwrap();

    let posts_query = driver.find("FROM \"posts\"");
    assert_eq!(
        posts_query.expression,
        "SELECT \"$posts$\".\"title\", \"$posts$\".\"user_id\" FROM \"posts\" AS \"$posts$\" \
         WHERE (\"$posts$\".\"title\" = ? OR \"$posts$\".\"title\" = ?) \
         AND \"$posts$\".\"user_id\" IN (?)"
    );
    assert_eq!(posts_query.bindings.len(), 3);
}

#[tokio::test]
async fn test_one_to_many_without_owner_keys_skips_query() {
    let driver = MockDriver::new();
    driver.on("FROM \"users\"", vec![json!({"id": null, "name": "ghost"})]);
    let orm = orm(&driver);

    let mut query = orm.query("User").unwrap();
    query.populate("posts").unwrap();
    let users = query.execute(&orm).await.unwrap().into_vec();

    assert_eq!(driver.expressions().len(), 1);
    assert!(many(users[0].as_ref(), "posts").is_empty());

    // No owners at all: nothing to populate.
    let empty = MockDriver::new();
    let orm = Orm::new(empty.clone(), blog_registry());
    let mut query = orm.query("User").unwrap();
    query.populate("posts").unwrap();
    assert!(query.execute(&orm).await.unwrap().is_empty());
    assert_eq!(empty.expressions().len(), 1);
}

#[tokio::test]
async fn test_many_to_many_through_junction() {
    let driver = MockDriver::new();
    driver
        .on("FROM \"posts\"", vec![json!({"id": 1}), json!({"id": 2})])
        .on(
            "FROM \"tags\"",
            vec![
                json!({
                    "id": 10, "label": "rust",
                    "$tags$.$JunctionModel$.post_id": 1, "$tags$.$JunctionModel$.tag_id": 10,
                }),
                json!({
                    "id": 20, "label": "sql",
                    "$tags$.$JunctionModel$.post_id": 1, "$tags$.$JunctionModel$.tag_id": 20,
                }),
                json!({
                    "id": 10, "label": "rust",
                    "$tags$.$JunctionModel$.post_id": 2, "$tags$.$JunctionModel$.tag_id": 10,
                }),
            ],
        );
    let orm = orm(&driver);

    let mut query = orm.query("Post").unwrap();
    query.populate("tags").unwrap();
    let posts = query.execute(&orm).await.unwrap().into_vec();

    let tags_query = driver.find("FROM \"tags\"");
    assert_eq!(
        tags_query.expression,
        "SELECT \"$tags$\".*, \
         \"$tags$.$JunctionModel$\".\"post_id\" AS \"$tags$.$JunctionModel$.post_id\", \
         \"$tags$.$JunctionModel$\".\"tag_id\" AS \"$tags$.$JunctionModel$.tag_id\" \
         FROM \"tags\" AS \"$tags$\" \
         INNER JOIN \"post_tags\" AS \"$tags$.$JunctionModel$\" \
         ON \"$tags$.$JunctionModel$\".\"tag_id\" = \"$tags$\".\"id\" \
         WHERE \"$tags$.$JunctionModel$\".\"post_id\" IN (?, ?)"
    );

    let first = many(posts[0].as_ref(), "tags");
    assert_eq!(field_values(first, "id"), vec![json!(10), json!(20)]);
    // The junction row never reaches the targets.
    assert_eq!(first[0].to_json(), json!({"id": 10, "label": "rust"}));
    assert_eq!(
        field_values(many(posts[1].as_ref(), "tags"), "label"),
        vec![json!("rust")]
    );
}

#[tokio::test]
async fn test_recursive_chain_to_root() {
    let driver = MockDriver::new();
    driver
        .on(
            "WITH RECURSIVE",
            vec![
                json!({"id": 3, "parent_id": 2}),
                json!({"id": 2, "parent_id": 1}),
                json!({"id": 1, "parent_id": null}),
            ],
        )
        .on("FROM \"categories\"", vec![json!({"id": 3, "parent_id": 2})]);
    let orm = orm(&driver);

    let mut query = orm.query("Category").unwrap();
    query.where_("id", 3).unwrap().populate("parent").unwrap();
    let category = query.execute(&orm).await.unwrap().into_vec().remove(0);

    let recursive = driver.find("WITH RECURSIVE");
    assert_eq!(
        recursive.expression,
        "WITH RECURSIVE \"recursive_cte\" AS (SELECT \"$parent$\".* FROM \"categories\" AS \"$parent$\" \
         WHERE \"$parent$\".\"id\" IN (?) \
         UNION SELECT \"recursive_step\".* FROM \"categories\" AS \"recursive_step\" \
         INNER JOIN \"recursive_cte\" ON \"recursive_step\".\"id\" = \"recursive_cte\".\"parent_id\") \
         SELECT \"$parent$\".* FROM \"recursive_cte\" AS \"$parent$\""
    );
    assert_eq!(recursive.bindings, vec![SqlValue::Int(3)]);
    assert_eq!(
        category.to_json(),
        json!({
            "id": 3, "parent_id": 2,
            "parent": {
                "id": 2, "parent_id": 1,
                "parent": {"id": 1, "parent_id": null, "parent": null},
            },
        })
    );
}

#[tokio::test]
async fn test_recursion_limit_cuts_chain() {
    let driver = MockDriver::new();
    driver
        .on(
            "WITH RECURSIVE",
            vec![
                json!({"id": 3, "parent_id": 2}),
                json!({"id": 2, "parent_id": 1}),
                json!({"id": 1, "parent_id": null}),
            ],
        )
        .on("FROM \"categories\"", vec![json!({"id": 3, "parent_id": 2})]);
    let orm = orm(&driver).with_options(OrmOptions {
        recursion_limit: Some(1),
        ..OrmOptions::default()
    });

    let mut query = orm.query("Category").unwrap();
    query.populate("parent").unwrap();
    let category = query.execute(&orm).await.unwrap().into_vec().remove(0);

    assert_eq!(
        category.to_json()["parent"],
        json!({"id": 2, "parent_id": 1, "parent": null})
    );
}

#[test]
fn test_populate_inside_recursive_relation_rejected() {
    let orm = orm(&MockDriver::new());
    let mut query = orm.query("Category").unwrap();
    let result = query.populate_with("parent", |parent| {
        parent.populate("parent")?;
        Ok(())
    });
    assert!(matches!(result, Err(OrmError::InvalidOperation(_))));
}

#[test]
fn test_populate_twice_rejected() {
    let orm = orm(&MockDriver::new());
    let mut query = orm.query("Post").unwrap();
    query.populate("author").unwrap();
    assert!(matches!(
        query.populate("author"),
        Err(OrmError::InvalidOperation(_))
    ));
    assert!(matches!(
        query.populate("editor"),
        Err(OrmError::UnknownRelation { .. })
    ));
}

#[tokio::test]
async fn test_discrimination_picks_subtype() {
    let driver = MockDriver::new();
    driver.on(
        "FROM \"items\"",
        vec![
            json!({"id": 1, "type": "one"}),
            json!({"id": 2, "type": "zzz"}),
            json!({"id": 3, "type": null}),
        ],
    );
    let orm = orm(&driver);

    let items = orm
        .query("Item")
        .unwrap()
        .execute(&orm)
        .await
        .unwrap()
        .into_vec();

    assert!(items[0].is::<SubtypeA>());
    assert_eq!(items[0].get("id"), Some(json!(1)));
    assert!(items[1].is::<Entity>());
    assert_eq!(items[1].model_name(), "Item");
    assert_eq!(items[2].model_name(), "Item");
}

#[tokio::test]
async fn test_one_to_many_under_belongs_to() {
    let driver = MockDriver::new();
    driver
        .on(
            "FROM \"posts\" AS \"$author$.$posts$\"",
            vec![json!({"id": 1, "user_id": 5}), json!({"id": 9, "user_id": 5})],
        )
        .on(
            "FROM \"posts\" AS \"$Source$\"",
            vec![
                json!({
                    "id": 1, "user_id": 5, "title": "a",
                    "$author$.id": 5, "$author$.name": "ann", "$author$.company_id": null,
                }),
                json!({
                    "id": 4, "user_id": null, "title": "b",
                    "$author$.id": null, "$author$.name": null, "$author$.company_id": null,
                }),
            ],
        );
    let orm = orm(&driver);

    let mut query = orm.query("Post").unwrap();
    query
        .populate_with("author", |author| {
            author.populate("posts")?;
            Ok(())
        })
        .unwrap();
    let posts = query.execute(&orm).await.unwrap().into_vec();

    let nested = driver.find("AS \"$author$.$posts$\"");
    assert!(nested
        .expression
        .ends_with("WHERE \"$author$.$posts$\".\"user_id\" IN (?)"));
    assert_eq!(nested.bindings, vec![SqlValue::Int(5)]);

    let author = posts[0].relations().one("author").unwrap();
    assert_eq!(
        field_values(many(author, "posts"), "id"),
        vec![json!(1), json!(9)]
    );
    assert!(matches!(
        posts[1].relations().get("author"),
        Some(RelationValue::One(None))
    ));
}

#[tokio::test]
async fn test_first_or_fail_on_empty_result() {
    let driver = MockDriver::new();
    let orm = orm(&driver);

    let mut query = orm.query("User").unwrap();
    query.where_("id", 42).unwrap().first_or_fail();
    assert!(matches!(
        query.execute(&orm).await,
        Err(OrmError::EmptyResult)
    ));
    assert!(driver.expressions()[0].ends_with("LIMIT 1"));

    let mut query = orm.query("User").unwrap();
    query.first();
    assert!(query.execute(&orm).await.unwrap().into_first().is_none());
}

#[tokio::test]
async fn test_failing_relation_fails_whole_query() {
    let driver = MockDriver::new();
    driver
        .on("FROM \"posts\"", vec![json!({"id": 1})])
        .on("FROM \"comments\"", vec![json!({"id": 7, "post_id": 1})])
        .fail_on("FROM \"tags\"", "tags unavailable");
    let orm = orm(&driver);

    let mut query = orm.query("Post").unwrap();
    query.populate("comments").unwrap().populate("tags").unwrap();
    let result = query.execute(&orm).await;

    assert!(matches!(result, Err(OrmError::Driver(message)) if message == "tags unavailable"));
}
