//! Map catalog operations

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::utils::*;
use mapmart_types::meta_adapter::*;
use mapmart_types::prelude::*;

const MAP_COLUMNS: &str =
	"map_id, title, description, price, image, features, is_featured, is_premium, created_at";

fn map_from_row(row: &SqliteRow) -> Result<Map, sqlx::Error> {
	Ok(Map {
		map_id: row.try_get("map_id")?,
		title: row.try_get("title")?,
		description: row.try_get("description")?,
		price: row.try_get("price")?,
		image: row.try_get("image")?,
		features: row.try_get("features")?,
		is_featured: row.try_get("is_featured")?,
		is_premium: row.try_get("is_premium")?,
		created_at: row.try_get("created_at").map(Timestamp)?,
	})
}

pub(crate) async fn create(db: &SqlitePool, map: CreateMap<'_>) -> ClResult<i64> {
	let res = sqlx::query(
		"INSERT INTO maps (title, description, price, image, features, is_featured, is_premium, created_at)
		VALUES (?, ?, ?, ?, ?, ?, ?, unixepoch())",
	)
	.bind(map.title)
	.bind(map.description)
	.bind(map.price)
	.bind(map.image)
	.bind(map.features)
	.bind(map.is_featured)
	.bind(map.is_premium)
	.execute(db)
	.await
	.map_err(db_err)?;

	Ok(res.last_insert_rowid())
}

pub(crate) async fn read(db: &SqlitePool, map_id: i64) -> ClResult<Map> {
	let res = sqlx::query(&format!("SELECT {} FROM maps WHERE map_id = ?", MAP_COLUMNS))
		.bind(map_id)
		.fetch_one(db)
		.await;
	map_res(res, |row| map_from_row(&row))
}

/// Featured maps first, then newest first
pub(crate) async fn list(db: &SqlitePool, opts: &ListMapOptions) -> ClResult<Vec<Map>> {
	let (limit, offset) = paging(opts.limit, opts.offset, 50, 100);
	let mut query = sqlx::QueryBuilder::new(format!("SELECT {} FROM maps", MAP_COLUMNS));
	if let Some(featured) = opts.featured {
		query.push(" WHERE is_featured = ").push_bind(featured);
	}
	query
		.push(" ORDER BY is_featured DESC, created_at DESC, map_id DESC LIMIT ")
		.push_bind(limit)
		.push(" OFFSET ")
		.push_bind(offset);

	let rows = query.build().fetch_all(db).await.map_err(db_err)?;
	collect_res(rows.iter().map(map_from_row))
}

pub(crate) async fn count(db: &SqlitePool) -> ClResult<u64> {
	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM maps")
		.fetch_one(db)
		.await
		.map_err(db_err)?;
	Ok(count as u64)
}

pub(crate) async fn update(db: &SqlitePool, map_id: i64, data: &UpdateMapData) -> ClResult<()> {
	let mut query = sqlx::QueryBuilder::new("UPDATE maps SET ");
	let mut has_updates = false;
	{
		let mut fields = query.separated(", ");
		if let Some(title) = &data.title {
			fields.push("title = ").push_bind_unseparated(title.as_ref());
			has_updates = true;
		}
		if let Some(description) = &data.description {
			fields.push("description = ").push_bind_unseparated(description.as_ref());
			has_updates = true;
		}
		if let Some(price) = data.price {
			fields.push("price = ").push_bind_unseparated(price);
			has_updates = true;
		}
		if let Some(image) = &data.image {
			fields.push("image = ").push_bind_unseparated(image.as_ref());
			has_updates = true;
		}
		if let Some(features) = &data.features {
			fields.push("features = ").push_bind_unseparated(features.as_ref());
			has_updates = true;
		}
		if let Some(is_featured) = data.is_featured {
			fields.push("is_featured = ").push_bind_unseparated(is_featured);
			has_updates = true;
		}
		if let Some(is_premium) = data.is_premium {
			fields.push("is_premium = ").push_bind_unseparated(is_premium);
			has_updates = true;
		}
	}
	if !has_updates {
		return Ok(());
	}
	query.push(" WHERE map_id = ").push_bind(map_id);

	let res = query.build().execute(db).await.map_err(db_err)?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

/// Comments and purchases go with the map through `ON DELETE CASCADE`
pub(crate) async fn delete(db: &SqlitePool, map_id: i64) -> ClResult<()> {
	let res = sqlx::query("DELETE FROM maps WHERE map_id = ?")
		.bind(map_id)
		.execute(db)
		.await
		.map_err(db_err)?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

// vim: ts=4
