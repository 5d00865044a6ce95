//! Category subcommands. Mutations need an admin token.

use anyhow::Result;

use cartsync_core::{Category, CategoryService};

use crate::app::App;

fn print_categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories.");
        return;
    }
    for c in categories {
        let flag = if c.visible { "" } else { " (hidden)" };
        println!("{:>4}  {:<24} /{}{}", c.id, c.name, c.url, flag);
    }
}

pub async fn list(app: &App, admin: bool) -> Result<()> {
    let mut svc = app.category_service();
    let categories = if admin {
        svc.get_admin_categories().await?
    } else {
        svc.get_categories().await?
    };
    print_categories(categories);
    Ok(())
}

pub async fn add(app: &App, name: String, url: String, visible: bool) -> Result<()> {
    let mut svc = app.category_service();
    let mut category = svc.create_new_category();
    category.name = name;
    category.url = url;
    category.visible = visible;

    svc.add_category(&category).await?;
    print_admin(&svc);
    Ok(())
}

pub async fn update(app: &App, id: i32, name: String, url: String, visible: bool) -> Result<()> {
    let mut svc = app.category_service();
    let category = Category {
        id,
        name,
        url,
        visible,
        ..Category::default()
    };

    svc.update_category(&category).await?;
    print_admin(&svc);
    Ok(())
}

pub async fn delete(app: &App, id: i32) -> Result<()> {
    let mut svc = app.category_service();
    svc.delete_category(id).await?;
    print_admin(&svc);
    Ok(())
}

fn print_admin(svc: &CategoryService) {
    print_categories(svc.admin_categories());
}
