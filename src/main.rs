use todo_api::rocket_instance;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    rocket_instance().launch().await?;
    Ok(())
}
